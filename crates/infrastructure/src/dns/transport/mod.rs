pub mod https;

pub use https::ReqwestExchanger;

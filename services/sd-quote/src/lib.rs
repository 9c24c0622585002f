//! sd-quote - 报价定价管控与报价转订单服务
//!
//! 阶梯价与利润率区间、手工改价校验、报价行批量保存、KAM 认领、
//! 报价转订单以及经销商跟进看板。

pub mod api;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;

//! armature-adapter-redis - 缓存适配器
//!
//! 基于 ConnectionManager 的 Redis 连接工厂与命令门面

mod connection;
mod store;

pub use connection::*;
pub use store::*;

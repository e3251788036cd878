//! armature-adapter-database - 数据库适配器
//!
//! 按提供方（postgres / mysql）穷尽分派的连接工厂，带有界重试

mod connection;
mod dsn;
mod pool;

pub use connection::*;
pub use pool::*;

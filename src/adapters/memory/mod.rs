pub mod store;
pub mod transaction;

// パブリックに型を再エクスポート
pub use store::MemoryStore;
pub use transaction::MemoryTransaction;

//! Flujos concretos, agrupados por producto.

pub mod borrow;
pub mod earn;
pub mod governance;
pub mod leverage;
pub mod redeem;
pub mod sbold;

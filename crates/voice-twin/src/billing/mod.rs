//! Billing: operator-issued discount codes and checkout webhook recording.

pub mod checkout;
pub mod discount;

#[cfg(test)]
mod tests;

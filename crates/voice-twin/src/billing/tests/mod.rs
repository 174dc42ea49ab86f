mod checkout;
mod common;

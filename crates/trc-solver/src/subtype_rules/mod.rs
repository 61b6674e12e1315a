//! Subtype rules, split by the shape of the types compared.

mod nominal;
mod structural;
mod unions;

mod customer;
mod product;
mod record;
mod table;

pub use customer::Customer;
pub use product::Product;
pub use record::Record;
pub use table::Table;

/// A typed entity that belongs to one fixed table.
pub trait Entity {
    const TABLE: Table;

    fn into_record(self) -> Record;
}

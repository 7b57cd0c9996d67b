use uuid::Uuid;

use super::{Entity, Record, Table};

/// A customer of a center.
#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    pub id: String,
    pub center_id: String,
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub balance: f64,
}

impl Customer {
    pub fn new(center_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            center_id: center_id.into(),
            name: name.into(),
            phone: None,
            address: None,
            balance: 0.0,
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_balance(mut self, balance: f64) -> Self {
        self.balance = balance;
        self
    }
}

impl Entity for Customer {
    const TABLE: Table = Table::Customers;

    fn into_record(self) -> Record {
        let mut record = Record::new(self.center_id)
            .with_id(self.id)
            .with_field("name", self.name)
            .with_field("balance", self.balance);
        if let Some(phone) = self.phone {
            record = record.with_field("phone", phone);
        }
        if let Some(address) = self.address {
            record = record.with_field("address", address);
        }
        record
    }
}

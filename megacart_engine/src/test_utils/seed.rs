use crate::{
    db_types::{Money, NewProduct, NewUser, NewVendor, PaymentDetails, Product, Role, ShippingAddress, User, Vendor},
    traits::{CatalogManagement, PayoutManagement},
};

pub struct SeededVendor {
    pub vendor: Vendor,
    pub products: Vec<Product>,
}

pub fn test_address() -> ShippingAddress {
    ShippingAddress {
        full_name: "Ananya Rao".into(),
        line1: "221 Residency Road".into(),
        line2: Some("Flat 3B".into()),
        city: "Bengaluru".into(),
        state: "Karnataka".into(),
        postal_code: "560025".into(),
        country: "IN".into(),
        phone: Some("+91 98450 00000".into()),
    }
}

pub async fn seed_buyer<B: CatalogManagement>(db: &B, email: &str) -> User {
    db.insert_user(NewUser::new(email, "Test Buyer", Role::Buyer)).await.expect("Error creating buyer")
}

/// Creates a vendor with a UPI id on file and one product per `(name, price, stock)` entry.
pub async fn seed_vendor<B>(db: &B, email: &str, products: &[(&str, i64, i64)]) -> SeededVendor
where B: CatalogManagement + PayoutManagement {
    let user = db.insert_user(NewUser::new(email, "Test Vendor", Role::Vendor)).await.expect("Error creating user");
    db.insert_vendor(NewVendor::new(user.id, format!("Shop of {email}"))).await.expect("Error creating vendor");
    let details = PaymentDetails { upi_id: Some(format!("{}@upi", user.id)), ..Default::default() };
    let vendor = db.update_payment_details(user.id, details).await.expect("Error saving payment details");
    let mut result = Vec::with_capacity(products.len());
    for (name, price, stock) in products {
        let product = NewProduct::new(user.id, *name, Money::from(*price), *stock);
        result.push(db.insert_product(product).await.expect("Error creating product"));
    }
    SeededVendor { vendor, products: result }
}

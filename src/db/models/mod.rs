//! Database Models
//!
//! Serde models for the SurrealDB tables. Record links use
//! [`surrealdb::RecordId`]; monetary values are stored as `f64` and rounded
//! through the pricing module before they are written.

pub mod brand;
pub mod cart;
pub mod category;
pub mod coupon;
pub mod order;
pub mod product;
pub mod user;
pub mod variant;

pub use brand::{Brand, BrandCreate, BrandUpdate};
pub use cart::{Cart, CartItem, CartItemView, CartView, CouponApplied};
pub use category::{Category, CategoryCreate, CategoryOffer, CategoryUpdate};
pub use coupon::{Coupon, CouponCreate, CouponUpdate, DiscountType};
pub use order::{Order, OrderLine, OrderStatus, PaymentStatus};
pub use product::{Product, ProductCreate, ProductUpdate};
pub use user::{Role, User, UserPublic};
pub use variant::{Variant, VariantCreate, VariantUpdate};

pub mod ad;
pub mod ad_click;
pub mod ad_impression;

pub use ad::Entity as AdEntity;
pub use ad_click::Entity as AdClickEntity;
pub use ad_impression::Entity as AdImpressionEntity;

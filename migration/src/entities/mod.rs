pub mod click_log;
pub mod mailing_list;
pub mod otp_code;
pub mod product;
pub mod setting;
pub mod short_url;
pub mod user;

pub use click_log::Entity as ClickLogEntity;
pub use mailing_list::Entity as MailingListEntity;
pub use otp_code::Entity as OtpCodeEntity;
pub use product::Entity as ProductEntity;
pub use setting::Entity as SettingEntity;
pub use short_url::Entity as ShortUrlEntity;
pub use user::Entity as UserEntity;

//! API Module
//!
//! Typed surfaces of the iCASH REST API. Each trait mirrors one server
//! resource; `HttpApiClient` implements all of them, tests substitute
//! in-memory fakes.

mod client;
pub mod errors;

pub use client::*;

use crate::error::IcashResult;
use crate::history::HistoryQuery;
use crate::types::*;
use secrecy::SecretString;

/// Betting platforms (`platformApi`)
pub trait PlatformApi {
    fn platforms(&self) -> IcashResult<Vec<Platform>>;
}

/// Mobile-money networks (`networkApi`)
pub trait NetworkApi {
    fn networks(&self) -> IcashResult<Vec<Network>>;
}

/// Bet IDs linked to platforms (`userAppIdApi`)
pub trait UserAppIdApi {
    fn search_user(&self, platform_id: &str, bet_id: &str) -> IcashResult<BetIdSearch>;
    fn user_app_ids(&self) -> IcashResult<Vec<UserAppId>>;
    fn user_app_ids_for(&self, platform_id: &str) -> IcashResult<Vec<UserAppId>>;
    fn create_user_app_id(&self, bet_id: &str, platform_id: &str) -> IcashResult<UserAppId>;
    fn update_user_app_id(&self, id: u64, bet_id: &str, platform_id: &str) -> IcashResult<UserAppId>;
    fn delete_user_app_id(&self, id: u64) -> IcashResult<()>;
}

/// Registered phone numbers (`phoneApi`)
pub trait PhoneApi {
    fn phones(&self) -> IcashResult<Vec<UserPhone>>;
    fn create_phone(&self, phone: &str, network: u64) -> IcashResult<UserPhone>;
    fn update_phone(&self, id: u64, phone: &str, network: u64) -> IcashResult<UserPhone>;
    fn delete_phone(&self, id: u64) -> IcashResult<()>;
}

/// Transactions (`transactionApi`)
pub trait TransactionApi {
    fn create_deposit(&self, request: &TransactionRequest) -> IcashResult<TransactionResponse>;
    fn create_withdrawal(&self, request: &TransactionRequest) -> IcashResult<TransactionResponse>;
    fn history(&self, query: &HistoryQuery) -> IcashResult<Page<Transaction>>;
    fn transaction(&self, id: u64) -> IcashResult<Transaction>;

    /// Route a request to the endpoint for its direction
    fn create_transaction(
        &self,
        kind: TransactionKind,
        request: &TransactionRequest,
    ) -> IcashResult<TransactionResponse> {
        match kind {
            TransactionKind::Deposit => self.create_deposit(request),
            TransactionKind::Withdrawal => self.create_withdrawal(request),
        }
    }
}

/// Server settings (`settingsApi`)
pub trait SettingsApi {
    fn settings(&self) -> IcashResult<Settings>;
}

/// Accounts (`authApi`)
pub trait AuthApi {
    fn login(&self, identifier: &str, password: &SecretString) -> IcashResult<LoginResponse>;
    fn register(&self, request: &RegisterRequest) -> IcashResult<()>;
    fn request_otp(&self, email: &str) -> IcashResult<()>;
    fn reset_password(&self, otp: &str, new_password: &SecretString, confirm: &SecretString) -> IcashResult<()>;
    fn profile(&self) -> IcashResult<User>;
    fn update_profile(&self, update: &ProfileUpdate) -> IcashResult<User>;
    fn change_password(&self, change: &PasswordChange) -> IcashResult<()>;
}

/// Server notifications (`notificationApi`)
pub trait NotificationApi {
    fn notifications(&self, page: u32) -> IcashResult<Page<Notification>>;
}

/// Coupons (`couponApi`)
pub trait CouponApi {
    fn coupons(&self, page: u32) -> IcashResult<Page<Coupon>>;
}

/// Dashboard advertisement (`advertisementApi`)
pub trait AdvertisementApi {
    fn advertisement(&self) -> IcashResult<Option<Advertisement>>;
}

//! HTTP API Client
//!
//! Blocking implementation of every API trait over reqwest. The access
//! token comes from an explicit `Session`; nothing is read from globals.

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use url::Url;

use super::errors::decode_error;
use super::*;
use crate::auth::session::Session;
use crate::config::ClientConfig;
use crate::error::{IcashError, IcashResult};
use crate::utils::{build_client, join_url, parse_json, query_string};
use crate::{log_debug, log_warn};

/// Endpoint paths relative to the configured base URL
pub mod paths {
    pub const LOGIN: &str = "auth/login";
    pub const REGISTER: &str = "auth/registration";
    pub const REQUEST_OTP: &str = "auth/password_reset";
    pub const RESET_PASSWORD: &str = "auth/new_password";
    pub const PROFILE: &str = "auth/me";
    pub const EDIT_PROFILE: &str = "auth/edit";
    pub const CHANGE_PASSWORD: &str = "auth/change_password";
    pub const PLATFORMS: &str = "plateform";
    pub const NETWORKS: &str = "network";
    pub const PHONES: &str = "user-phone/";
    pub const USER_APP_IDS: &str = "user-app-id/";
    pub const SEARCH_USER: &str = "search-user";
    pub const DEPOSIT: &str = "transaction-deposit";
    pub const WITHDRAWAL: &str = "transaction-withdrawal";
    pub const HISTORY: &str = "transaction-history";
    pub const TRANSACTION: &str = "transaction";
    pub const SETTINGS: &str = "setting";
    pub const NOTIFICATIONS: &str = "notification";
    pub const COUPONS: &str = "coupon";
    pub const ADVERTISEMENT: &str = "ann";
}

/// REST client for the iCASH API
pub struct HttpApiClient {
    client: Client,
    base_url: Url,
    access_token: Option<SecretString>,
}

impl HttpApiClient {
    /// Create a client for the configured API
    pub fn new(config: &ClientConfig) -> IcashResult<Self> {
        config.validate()?;
        Ok(Self {
            client: build_client(config)?,
            base_url: config.api_url()?,
            access_token: None,
        })
    }

    /// Authenticate subsequent calls with the session's access token
    pub fn attach_session(&mut self, session: &Session) {
        self.access_token = session
            .access_token()
            .map(|t| SecretString::from(t.expose_secret().to_string()));
    }

    /// Drop credentials (after logout)
    pub fn detach_session(&mut self) {
        self.access_token = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> IcashResult<RequestBuilder> {
        let url = join_url(&self.base_url, path)?;
        log_debug!("api", "Request", method = method, path = url.path());

        let builder = self.client.request(method, url);
        Ok(match self.access_token {
            Some(ref token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        })
    }

    fn send_raw(&self, builder: RequestBuilder) -> IcashResult<String> {
        let response = builder.send()?;
        let status = response.status();
        let body = response.text()?;

        if !status.is_success() {
            let err = decode_error(status.as_u16(), &body);
            log_warn!("api", "Request failed", status = status.as_u16(), code = format!("{:?}", err.code));
            return Err(err);
        }
        Ok(body)
    }

    fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> IcashResult<T> {
        let body = self.send_raw(builder)?;
        parse_json(&body)
    }

    fn send_empty(&self, builder: RequestBuilder) -> IcashResult<()> {
        self.send_raw(builder).map(|_| ())
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> IcashResult<T> {
        self.send(self.request(Method::GET, path)?)
    }

    fn get_with_query<T: DeserializeOwned>(&self, path: &str, params: &[(&str, String)]) -> IcashResult<T> {
        let qs = query_string(params);
        let full = if qs.is_empty() {
            path.to_string()
        } else {
            format!("{}?{}", path, qs)
        };
        self.get(&full)
    }

    fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> IcashResult<T> {
        self.send(self.request(Method::POST, path)?.json(body))
    }

    fn post_empty<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> IcashResult<()> {
        self.send_empty(self.request(Method::POST, path)?.json(body))
    }

    fn require_auth(&self) -> IcashResult<()> {
        if self.access_token.is_none() {
            return Err(IcashError::auth_error("Veuillez vous connecter"));
        }
        Ok(())
    }
}

impl PlatformApi for HttpApiClient {
    fn platforms(&self) -> IcashResult<Vec<Platform>> {
        self.get(paths::PLATFORMS)
    }
}

impl NetworkApi for HttpApiClient {
    fn networks(&self) -> IcashResult<Vec<Network>> {
        self.get(paths::NETWORKS)
    }
}

impl UserAppIdApi for HttpApiClient {
    fn search_user(&self, platform_id: &str, bet_id: &str) -> IcashResult<BetIdSearch> {
        self.require_auth()?;
        self.post(paths::SEARCH_USER, &json!({ "app_id": platform_id, "userid": bet_id }))
    }

    fn user_app_ids(&self) -> IcashResult<Vec<UserAppId>> {
        self.require_auth()?;
        self.get(paths::USER_APP_IDS)
    }

    fn user_app_ids_for(&self, platform_id: &str) -> IcashResult<Vec<UserAppId>> {
        self.require_auth()?;
        self.get_with_query(paths::USER_APP_IDS, &[("app_id", platform_id.to_string())])
    }

    fn create_user_app_id(&self, bet_id: &str, platform_id: &str) -> IcashResult<UserAppId> {
        self.require_auth()?;
        self.post(paths::USER_APP_IDS, &json!({ "user_app_id": bet_id, "app": platform_id }))
    }

    fn update_user_app_id(&self, id: u64, bet_id: &str, platform_id: &str) -> IcashResult<UserAppId> {
        self.require_auth()?;
        let path = format!("{}{}/", paths::USER_APP_IDS, id);
        let body = json!({ "user_app_id": bet_id, "app": platform_id });
        self.send(self.request(Method::PATCH, &path)?.json(&body))
    }

    fn delete_user_app_id(&self, id: u64) -> IcashResult<()> {
        self.require_auth()?;
        let path = format!("{}{}/", paths::USER_APP_IDS, id);
        self.send_empty(self.request(Method::DELETE, &path)?)
    }
}

impl PhoneApi for HttpApiClient {
    fn phones(&self) -> IcashResult<Vec<UserPhone>> {
        self.require_auth()?;
        self.get(paths::PHONES)
    }

    fn create_phone(&self, phone: &str, network: u64) -> IcashResult<UserPhone> {
        self.require_auth()?;
        self.post(paths::PHONES, &json!({ "phone": phone, "network": network }))
    }

    fn update_phone(&self, id: u64, phone: &str, network: u64) -> IcashResult<UserPhone> {
        self.require_auth()?;
        let path = format!("{}{}/", paths::PHONES, id);
        let body = json!({ "phone": phone, "network": network });
        self.send(self.request(Method::PATCH, &path)?.json(&body))
    }

    fn delete_phone(&self, id: u64) -> IcashResult<()> {
        self.require_auth()?;
        let path = format!("{}{}/", paths::PHONES, id);
        self.send_empty(self.request(Method::DELETE, &path)?)
    }
}

impl TransactionApi for HttpApiClient {
    fn create_deposit(&self, request: &TransactionRequest) -> IcashResult<TransactionResponse> {
        self.require_auth()?;
        self.post(paths::DEPOSIT, request)
    }

    fn create_withdrawal(&self, request: &TransactionRequest) -> IcashResult<TransactionResponse> {
        self.require_auth()?;
        self.post(paths::WITHDRAWAL, request)
    }

    fn history(&self, query: &HistoryQuery) -> IcashResult<Page<Transaction>> {
        self.require_auth()?;
        self.get_with_query(paths::HISTORY, &query.params())
    }

    fn transaction(&self, id: u64) -> IcashResult<Transaction> {
        self.require_auth()?;
        self.get(&format!("{}/{}/", paths::TRANSACTION, id))
    }
}

impl SettingsApi for HttpApiClient {
    fn settings(&self) -> IcashResult<Settings> {
        self.get(paths::SETTINGS)
    }
}

impl AuthApi for HttpApiClient {
    fn login(&self, identifier: &str, password: &SecretString) -> IcashResult<LoginResponse> {
        let body = json!({ "email_or_phone": identifier, "password": password.expose_secret() });
        self.post(paths::LOGIN, &body)
    }

    fn register(&self, request: &RegisterRequest) -> IcashResult<()> {
        self.post_empty(paths::REGISTER, request)
    }

    fn request_otp(&self, email: &str) -> IcashResult<()> {
        self.post_empty(paths::REQUEST_OTP, &json!({ "email": email }))
    }

    fn reset_password(&self, otp: &str, new_password: &SecretString, confirm: &SecretString) -> IcashResult<()> {
        let body = json!({
            "otp": otp,
            "new_password": new_password.expose_secret(),
            "confirm_new_password": confirm.expose_secret(),
        });
        self.post_empty(paths::RESET_PASSWORD, &body)
    }

    fn profile(&self) -> IcashResult<User> {
        self.require_auth()?;
        self.get(paths::PROFILE)
    }

    fn update_profile(&self, update: &ProfileUpdate) -> IcashResult<User> {
        self.require_auth()?;
        self.send(self.request(Method::PATCH, paths::EDIT_PROFILE)?.json(update))
    }

    fn change_password(&self, change: &PasswordChange) -> IcashResult<()> {
        self.require_auth()?;
        self.post_empty(paths::CHANGE_PASSWORD, change)
    }
}

impl NotificationApi for HttpApiClient {
    fn notifications(&self, page: u32) -> IcashResult<Page<Notification>> {
        self.require_auth()?;
        self.get_with_query(paths::NOTIFICATIONS, &[("page", page.max(1).to_string())])
    }
}

impl CouponApi for HttpApiClient {
    fn coupons(&self, page: u32) -> IcashResult<Page<Coupon>> {
        self.require_auth()?;
        self.get_with_query(paths::COUPONS, &[("page", page.max(1).to_string())])
    }
}

impl AdvertisementApi for HttpApiClient {
    fn advertisement(&self) -> IcashResult<Option<Advertisement>> {
        let value: serde_json::Value = self.get(paths::ADVERTISEMENT)?;
        advertisement_from_value(value)
    }
}

/// The endpoint answers with `null`, an object, or a list of objects
fn advertisement_from_value(value: serde_json::Value) -> IcashResult<Option<Advertisement>> {
    let candidate = match value {
        serde_json::Value::Null => return Ok(None),
        serde_json::Value::Array(items) => match items.into_iter().next() {
            Some(first) => first,
            None => return Ok(None),
        },
        other => other,
    };
    let ad: Advertisement = serde_json::from_value(candidate)?;
    Ok(ad.enable.then_some(ad))
}

//! Accounts, credentials and sessions

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{MarketError, MarketResult};
use crate::jwt::JwtService;
use crate::models::{
    Account, DEFAULT_PROFILE_IMAGE, Hub, NewAccount, Role, RoleProfile, VendorField,
};
use crate::repositories::{AccountRepository, CartRepository, UniqueViolation};
use crate::validation::{
    validate_image_name, validate_password, validate_profile_field, validate_username,
};

const INVALID_CREDENTIALS: &str = "Invalid username or password";
const INVALID_SESSION: &str = "Invalid or expired session";

/// Signup form
#[derive(Debug, Clone, Deserialize)]
pub struct Signup {
    pub username: String,
    pub password: String,
    /// Uploaded profile image; the placeholder when absent
    pub profile_image: Option<String>,
    /// `vendor`, `customer` or `shipper`
    pub role: String,
    pub name: Option<String>,
    pub address: Option<String>,
    pub hub: Option<String>,
}

/// Who is making a request
#[derive(Debug, Clone)]
pub enum Caller {
    Guest,
    Account { account: Account, token: String },
}

impl Caller {
    pub fn is_guest(&self) -> bool {
        matches!(self, Caller::Guest)
    }

    /// The signed-in account; guests get an auth error
    pub fn account(&self) -> MarketResult<&Account> {
        match self {
            Caller::Guest => Err(MarketError::Auth("Sign in required".to_string())),
            Caller::Account { account, .. } => Ok(account),
        }
    }

    /// The signed-in account, which must hold `role`
    pub fn require(&self, role: Role) -> MarketResult<&Account> {
        let account = self.account()?;
        if account.role() != role {
            return Err(MarketError::Forbidden);
        }
        Ok(account)
    }

    pub fn token(&self) -> Option<&str> {
        match self {
            Caller::Guest => None,
            Caller::Account { token, .. } => Some(token),
        }
    }
}

/// Account service
pub struct AccountService<A: AccountRepository, C: CartRepository> {
    accounts: A,
    carts: C,
    jwt: JwtService,
    hasher: Argon2<'static>,
}

impl<A: AccountRepository, C: CartRepository> AccountService<A, C> {
    pub fn new(accounts: A, carts: C, jwt: JwtService) -> Self {
        Self::with_hasher(accounts, carts, jwt, Argon2::default())
    }

    pub fn with_hasher(accounts: A, carts: C, jwt: JwtService, hasher: Argon2<'static>) -> Self {
        Self {
            accounts,
            carts,
            jwt,
            hasher,
        }
    }

    /// Register a new account with exactly the role the form selects
    pub async fn create_account(&self, signup: Signup) -> MarketResult<Account> {
        validate_username(&signup.username).map_err(MarketError::Validation)?;
        validate_password(&signup.password).map_err(MarketError::Validation)?;

        let profile_image = match signup.profile_image.as_deref() {
            Some(image) => {
                validate_image_name(image).map_err(MarketError::Validation)?;
                image.to_string()
            }
            None => DEFAULT_PROFILE_IMAGE.to_string(),
        };

        let role: Role = signup.role.parse()?;
        let profile = match role {
            Role::Vendor => RoleProfile::Vendor {
                name: validate_profile_field("Business name", signup.name.as_deref())
                    .map_err(MarketError::Validation)?,
                address: validate_profile_field("Business address", signup.address.as_deref())
                    .map_err(MarketError::Validation)?,
            },
            Role::Customer => RoleProfile::Customer {
                name: validate_profile_field("Name", signup.name.as_deref())
                    .map_err(MarketError::Validation)?,
                address: validate_profile_field("Address", signup.address.as_deref())
                    .map_err(MarketError::Validation)?,
            },
            Role::Shipper => {
                let hub = signup
                    .hub
                    .as_deref()
                    .ok_or_else(|| MarketError::Validation("Hub is required".to_string()))?;
                RoleProfile::Shipper {
                    hub: hub.parse::<Hub>()?,
                }
            }
        };

        if self.accounts.username_taken(&signup.username).await? {
            return Err(MarketError::Conflict(format!(
                "Username {} is already taken",
                signup.username
            )));
        }

        if let RoleProfile::Vendor { name, address } = &profile {
            if self
                .accounts
                .vendor_field_taken(VendorField::Name, name)
                .await?
            {
                return Err(MarketError::Conflict(format!(
                    "Business name {name} is already taken"
                )));
            }
            if self
                .accounts
                .vendor_field_taken(VendorField::Address, address)
                .await?
            {
                return Err(MarketError::Conflict(format!(
                    "Business address {address} is already taken"
                )));
            }
        }

        let password_hash = self.hash_password(&signup.password)?;
        let account = self
            .accounts
            .create(NewAccount {
                username: signup.username,
                password_hash,
                profile_image,
                profile,
            })
            .await
            .map_err(|e| match e.downcast_ref::<UniqueViolation>() {
                Some(violation) => MarketError::Conflict(conflict_message(&violation.constraint)),
                None => e.into(),
            })?;

        self.ensure_cart(&account).await?;

        info!("Created {} account {}", account.role(), account.username);
        Ok(account)
    }

    /// Check a username and password; unknown users and wrong passwords fail alike
    pub async fn authenticate(&self, username: &str, password: &str) -> MarketResult<Account> {
        let Some(account) = self.accounts.find_by_username(username).await? else {
            // Spend the same hashing work as a real verification
            self.hash_password(password)?;
            return Err(MarketError::Auth(INVALID_CREDENTIALS.to_string()));
        };

        if !self.verify_password(&account, password)? {
            return Err(MarketError::Auth(INVALID_CREDENTIALS.to_string()));
        }

        Ok(account)
    }

    /// Authenticate, make sure a customer has its cart, and open a session
    pub async fn sign_in(&self, username: &str, password: &str) -> MarketResult<(Account, String)> {
        let account = self.authenticate(username, password).await?;
        self.ensure_cart(&account).await?;
        let token = self.issue_session_token(&account).await?;
        info!("Account {} signed in", account.username);
        Ok((account, token))
    }

    /// Mint a token for the account and add it to its active set
    pub async fn issue_session_token(&self, account: &Account) -> MarketResult<String> {
        let token = self.jwt.generate_token(account.id)?;
        self.accounts.add_session_token(account.id, &token).await?;
        Ok(token)
    }

    /// Remove exactly `token` from the account's active set
    pub async fn revoke_session_token(&self, account: &Account, token: &str) -> MarketResult<()> {
        if self
            .accounts
            .remove_session_token(account.id, token)
            .await?
        {
            info!("Account {} signed out", account.username);
        }
        Ok(())
    }

    pub fn role_of(&self, account: &Account) -> Role {
        account.role()
    }

    pub async fn username_exists(&self, username: &str) -> MarketResult<bool> {
        Ok(self.accounts.username_taken(username.trim()).await?)
    }

    pub async fn vendor_field_exists(&self, field: VendorField, value: &str) -> MarketResult<bool> {
        Ok(self.accounts.vendor_field_taken(field, value.trim()).await?)
    }

    /// Whether the pair would sign in, without opening a session
    pub async fn credentials_valid(&self, username: &str, password: &str) -> MarketResult<bool> {
        match self.authenticate(username, password).await {
            Ok(_) => Ok(true),
            Err(MarketError::Auth(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn update_profile_image(
        &self,
        account: &Account,
        image: &str,
    ) -> MarketResult<Account> {
        validate_image_name(image).map_err(MarketError::Validation)?;
        self.set_profile_image(account, image).await
    }

    /// Reset the profile image to the placeholder
    pub async fn remove_profile_image(&self, account: &Account) -> MarketResult<Account> {
        self.set_profile_image(account, DEFAULT_PROFILE_IMAGE).await
    }

    async fn set_profile_image(&self, account: &Account, image: &str) -> MarketResult<Account> {
        self.accounts
            .set_profile_image(account.id, image)
            .await?
            .ok_or_else(|| MarketError::NotFound("account".to_string()))
    }

    /// Create the customer's cart if it has none yet
    pub async fn ensure_cart(&self, account: &Account) -> MarketResult<()> {
        if account.role() != Role::Customer {
            return Ok(());
        }
        if self.carts.cart_for_owner(account.id).await?.is_some() {
            return Ok(());
        }
        match self.carts.create_cart(account.id).await {
            Ok(_) => info!("Created cart for {}", account.username),
            Err(e) if e.is::<UniqueViolation>() => {
                info!("Cart for {} was created concurrently", account.username)
            }
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    /// Resolve the session token carried by a request
    ///
    /// No token means a guest. A token that fails verification, or that the
    /// account no longer holds, is an auth error.
    pub async fn resolve_session(&self, token: Option<&str>) -> MarketResult<Caller> {
        let Some(token) = token else {
            return Ok(Caller::Guest);
        };

        let claims = self.jwt.validate_token(token).map_err(|e| {
            warn!("Rejected session token: {}", e);
            MarketError::Auth(INVALID_SESSION.to_string())
        })?;

        let account = self
            .accounts
            .find_by_session(claims.sub, token)
            .await?
            .ok_or_else(|| MarketError::Auth(INVALID_SESSION.to_string()))?;

        Ok(Caller::Account {
            account,
            token: token.to_string(),
        })
    }

    fn hash_password(&self, password: &str) -> MarketResult<String> {
        let salt = SaltString::generate(&mut rand::thread_rng());
        let hash = self
            .hasher
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
            .to_string();
        Ok(hash)
    }

    fn verify_password(&self, account: &Account, password: &str) -> MarketResult<bool> {
        let parsed_hash = PasswordHash::new(&account.password_hash)
            .map_err(|e| anyhow::anyhow!("Failed to parse password hash: {}", e))?;

        Ok(self
            .hasher
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}

fn conflict_message(constraint: &str) -> String {
    match constraint {
        "accounts_vendor_name_key" => "Business name is already taken",
        "accounts_vendor_address_key" => "Business address is already taken",
        _ => "Username is already taken",
    }
    .to_string()
}

/// Cheapest Argon2id parameters, for tests
#[cfg(test)]
pub(crate) fn fast_hasher() -> Argon2<'static> {
    use argon2::{Algorithm, Params, Version};

    let params = Params::new(Params::MIN_M_COST, Params::MIN_T_COST, Params::MIN_P_COST, None)
        .unwrap();
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
}

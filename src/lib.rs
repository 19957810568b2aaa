pub mod media;
pub mod oauth_core;
pub mod providers;

pub use oauth_core::config::{ClientSettings, ProfileEndpoint, ProfileShape, ProviderConfig, TokenPlacement, TokenRequestEncoding};
pub use oauth_core::crypto::{Clock, FixedClock, FixedNonce, NonceSource, SystemClock, SystemNonce};
pub use oauth_core::http_client::{HttpClientError, HttpMethod, HttpRequest, HttpResponse, InMemoryHttpClient, OAuthHttpClient, RedirectPolicy};
#[cfg(feature = "reqwest-client")]
pub use oauth_core::http_client::ReqwestHttpClient;
pub use oauth_core::oauth_client::OAuthClient;
pub use oauth_core::session::{AuthorizationSession, SessionPhase};
pub use oauth_core::types::{AccessToken, EmailRecord, GrantStyle, OAuthError, ProfileData};

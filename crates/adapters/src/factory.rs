//! Provider lookup by identifier

use reqwest::Client;
use social_relay_domain::{
    LoginProvider, LoginProviderKind, MediaLoader, ProviderError, ProviderKind, SocialProvider,
};
use std::sync::Arc;

use crate::http::OAuthClientConfig;
use crate::linkedin::{LinkedInConfig, LinkedInProvider};
use crate::login::{
    GithubLoginProvider, GoogleLoginProvider, OpenIdEndpoints, OpenIdLoginProvider,
};
use crate::stub::StubSocialProvider;

/// OpenID Connect application and endpoints
#[derive(Debug, Clone)]
pub struct OpenIdConfig {
    pub app: OAuthClientConfig,
    pub endpoints: OpenIdEndpoints,
}

/// Per-provider settings; a provider without settings cannot be built
#[derive(Debug, Clone, Default)]
pub struct ProvidersConfig {
    pub linkedin: Option<LinkedInConfig>,
    pub linkedin_page: Option<LinkedInConfig>,
    pub github: Option<OAuthClientConfig>,
    pub google: Option<OAuthClientConfig>,
    pub openid: Option<OpenIdConfig>,
}

/// Builds a fresh adapter for each request
pub struct ProviderFactory {
    client: Client,
    config: ProvidersConfig,
    media: Arc<dyn MediaLoader>,
}

fn not_configured(section: &str) -> ProviderError {
    ProviderError::UnsupportedProvider(format!("{} (no [{}] configuration)", section, section))
}

impl ProviderFactory {
    pub fn new(client: Client, config: ProvidersConfig, media: Arc<dyn MediaLoader>) -> Self {
        Self {
            client,
            config,
            media,
        }
    }

    /// Concrete LinkedIn adapter, for LinkedIn-only operations
    pub fn linkedin(&self, kind: ProviderKind) -> Result<LinkedInProvider, ProviderError> {
        let (config, section) = match kind {
            ProviderKind::Linkedin => (&self.config.linkedin, "linkedin"),
            ProviderKind::LinkedinPage => (&self.config.linkedin_page, "linkedin_page"),
            ProviderKind::Stub => {
                return Err(ProviderError::UnsupportedProvider(format!(
                    "{} is not a LinkedIn provider",
                    kind
                )));
            }
        };
        let config = config.clone().ok_or_else(|| not_configured(section))?;
        let (client, media) = (self.client.clone(), self.media.clone());

        Ok(match kind {
            ProviderKind::LinkedinPage => LinkedInProvider::page(client, config, media),
            _ => LinkedInProvider::personal(client, config, media),
        })
    }

    pub fn social_provider(
        &self,
        kind: ProviderKind,
    ) -> Result<Box<dyn SocialProvider>, ProviderError> {
        tracing::debug!(provider = %kind, "Building social provider");
        match kind {
            ProviderKind::Linkedin | ProviderKind::LinkedinPage => {
                Ok(Box::new(self.linkedin(kind)?))
            }
            ProviderKind::Stub => Ok(Box::new(StubSocialProvider::new())),
        }
    }

    /// Look up a social provider by its stored identifier
    pub fn social_provider_by_name(
        &self,
        name: &str,
    ) -> Result<Box<dyn SocialProvider>, ProviderError> {
        self.social_provider(name.parse()?)
    }

    pub fn login_provider(
        &self,
        kind: LoginProviderKind,
    ) -> Result<Box<dyn LoginProvider>, ProviderError> {
        tracing::debug!(provider = %kind, "Building login provider");
        match kind {
            LoginProviderKind::Github => {
                let app = self.config.github.clone().ok_or_else(|| not_configured("github"))?;
                Ok(Box::new(GithubLoginProvider::new(self.client.clone(), app)))
            }
            LoginProviderKind::Google => {
                let app = self.config.google.clone().ok_or_else(|| not_configured("google"))?;
                Ok(Box::new(GoogleLoginProvider::new(self.client.clone(), app)))
            }
            LoginProviderKind::OpenId => {
                let openid = self.config.openid.clone().ok_or_else(|| not_configured("openid"))?;
                Ok(Box::new(OpenIdLoginProvider::new(
                    self.client.clone(),
                    openid.app,
                    openid.endpoints,
                )))
            }
        }
    }

    pub fn login_provider_by_name(
        &self,
        name: &str,
    ) -> Result<Box<dyn LoginProvider>, ProviderError> {
        self.login_provider(name.parse()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::InMemoryMediaLoader;
    use secrecy::SecretString;

    fn app() -> OAuthClientConfig {
        OAuthClientConfig {
            client_id: "id".to_string(),
            client_secret: SecretString::new("secret".into()),
            redirect_uri: "https://app.example.com/cb".to_string(),
        }
    }

    fn factory(config: ProvidersConfig) -> ProviderFactory {
        ProviderFactory::new(Client::new(), config, Arc::new(InMemoryMediaLoader::new()))
    }

    #[test]
    fn test_builds_configured_providers() {
        let factory = factory(ProvidersConfig {
            linkedin: Some(LinkedInConfig::new(app())),
            linkedin_page: Some(LinkedInConfig::new(app())),
            github: Some(app()),
            ..Default::default()
        });

        assert_eq!(
            factory.social_provider(ProviderKind::Linkedin).unwrap().identifier(),
            "linkedin"
        );
        assert_eq!(
            factory.social_provider_by_name("linkedin-page").unwrap().identifier(),
            "linkedin-page"
        );
        assert_eq!(
            factory.login_provider_by_name("github").unwrap().identifier(),
            "github"
        );
    }

    #[test]
    fn test_stub_needs_no_configuration() {
        let factory = factory(ProvidersConfig::default());
        assert_eq!(
            factory.social_provider(ProviderKind::Stub).unwrap().identifier(),
            "stub"
        );
    }

    #[test]
    fn test_unknown_identifier() {
        let factory = factory(ProvidersConfig::default());
        let err = factory.social_provider_by_name("myspace").err().unwrap();
        assert!(matches!(err, ProviderError::UnsupportedProvider(ref p) if p == "myspace"));
    }

    #[test]
    fn test_unconfigured_provider_names_section() {
        let factory = factory(ProvidersConfig::default());

        let err = factory.social_provider(ProviderKind::LinkedinPage).err().unwrap();
        assert!(err.to_string().contains("[linkedin_page]"));

        let err = factory.login_provider(LoginProviderKind::OpenId).err().unwrap();
        assert!(matches!(err, ProviderError::UnsupportedProvider(_)));
    }
}

use bon::Builder;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, TokenData};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

#[cfg(test)]
use mockall::{automock, predicate::*};

use crate::extensions::KeyFormat;

#[cfg_attr(test, automock)]
pub trait TokenManager {
    fn issue<T: Serialize + 'static>(&self, claims: &T) -> Result<String, TokenError>;
    fn validate<T: DeserializeOwned + 'static>(
        &self,
        token: &str,
    ) -> Result<TokenData<T>, TokenError>;
}

#[derive(Builder, Clone)]
pub struct TokenManagerImpl {
    #[builder(into)]
    encoding_key: SecretString,
    #[builder(into)]
    decoding_key: Option<String>,
    #[builder(into)]
    audience: String,
    #[builder(into)]
    issuer: String,
    algorithm: Algorithm,
    #[builder(into)]
    kid: Option<String>,
    format: KeyFormat,
    leeway: u64,
}

impl TokenManager for TokenManagerImpl {
    fn issue<T: Serialize>(&self, claims: &T) -> Result<String, TokenError> {
        let encoding_key = self.encoding_key()?;
        let mut header = jsonwebtoken::Header::new(self.algorithm);
        header.kid = self.kid.clone();
        let token =
            jsonwebtoken::encode(&header, claims, &encoding_key).map_err(TokenError::Encode)?;

        Ok(token)
    }

    fn validate<T: DeserializeOwned>(&self, token: &str) -> Result<TokenData<T>, TokenError> {
        let decoding_key = self.decoding_key()?;
        let mut validation = jsonwebtoken::Validation::new(self.algorithm);
        validation.leeway = self.leeway;
        validation.set_audience(&[&self.audience]);
        validation.set_issuer(&[&self.issuer]);
        jsonwebtoken::decode::<T>(token, &decoding_key, &validation).map_err(TokenError::Decode)
    }
}

impl TokenManagerImpl {
    fn encoding_key(&self) -> Result<EncodingKey, TokenError> {
        match (self.algorithm, self.format) {
            (Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512, KeyFormat::Secret) => Ok(
                EncodingKey::from_secret(self.encoding_key.expose_secret().as_bytes()),
            ),
            (Algorithm::EdDSA, KeyFormat::Pem) => {
                EncodingKey::from_ed_pem(self.encoding_key.expose_secret().as_bytes())
                    .map_err(TokenError::Format)
            }
            _ => Err(TokenError::UnsupportedFormat(self.algorithm, self.format)),
        }
    }

    fn decoding_key(&self) -> Result<DecodingKey, TokenError> {
        match (self.algorithm, self.format) {
            (Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512, KeyFormat::Secret) => Ok(
                DecodingKey::from_secret(self.encoding_key.expose_secret().as_bytes()),
            ),
            (Algorithm::EdDSA, KeyFormat::Pem) => {
                let public_key = self
                    .decoding_key
                    .as_deref()
                    .ok_or(TokenError::MissingPublicKey)?;
                DecodingKey::from_ed_pem(public_key.as_bytes()).map_err(TokenError::Format)
            }
            _ => Err(TokenError::UnsupportedFormat(self.algorithm, self.format)),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum TokenError {
    #[error("Error encoding token")]
    Encode(jsonwebtoken::errors::Error),
    #[error("Error decoding token")]
    Decode(jsonwebtoken::errors::Error),
    #[error("Error keys format")]
    Format(jsonwebtoken::errors::Error),
    #[error("Unsupported format: {0:?} {1:?}")]
    UnsupportedFormat(Algorithm, KeyFormat),
    #[error("Public key is required to validate tokens")]
    MissingPublicKey,
}

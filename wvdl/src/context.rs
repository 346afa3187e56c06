use crate::{Config, Error, Result, cookie};
use reqwest::blocking::{Client, Response};

/// Per run state shared by every stage.
pub struct Context {
    pub config: Config,
    pub client: Client,
    /// Validated `Cookie` header value built from `config.cookies`.
    pub cookie_header: String,
}

impl Context {
    pub fn new(config: Config) -> Result<Self> {
        let cookie_header = cookie::header_value(&config.cookies)?;
        let client = Client::builder()
            .cookie_store(true)
            .user_agent(&config.user_agent)
            .timeout(config.http_timeout)
            .build()
            .map_err(|x| Error::Config(format!("could not build http client: {}", x)))?;

        Ok(Self {
            config,
            client,
            cookie_header,
        })
    }
}

/// Body of an error response, or the reason it could not be read.
pub(crate) fn error_body(response: Response) -> String {
    response
        .text()
        .unwrap_or_else(|x| format!("<unreadable body: {}>", x))
}

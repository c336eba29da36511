// Import necessary crates and modules
use crate::GraderError;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Password};
use keyring::Entry;
use serde::{Deserialize, Serialize};

const URL_KEY: &str = "URL_CANVAS";
const TOKEN_KEY: &str = "TOKEN_CANVAS";

/// Structure to hold Canvas API credentials.
///
/// Fields:
/// - `url_canvas`: Base URL for the Canvas API, ending in `/api/v1`.
/// - `token_canvas`: API token for authentication.
///
/// Example usage:
/// ```
/// use canvas_discussion_grader::CanvasCredentials;
///
/// let canvas_credentials = CanvasCredentials {
///     url_canvas: "https://canvas.example.com/api/v1".to_string(),
///     token_canvas: "your_api_token".to_string(),
/// };
/// assert!(canvas_credentials.url_canvas.ends_with("/api/v1"));
/// ```
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct CanvasCredentials {
    pub url_canvas: String,
    pub token_canvas: String,
}

// Enum to represent the source of Canvas credentials.
enum CanvasCredentialType {
    None,
    EnvVariables(CanvasCredentials),
    SystemKeyring(CanvasCredentials),
}

impl CanvasCredentials {
    /// Builds credentials, trimming a trailing slash from the base URL.
    pub fn new(url: &str, token: &str) -> Self {
        CanvasCredentials {
            url_canvas: url.trim().trim_end_matches('/').to_string(),
            token_canvas: token.trim().to_string(),
        }
    }

    /// Joins an API path onto the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.url_canvas, path.trim_start_matches('/'))
    }

    /// Tests the validity of Canvas API credentials.
    ///
    /// Performs a GET request to `users/self`.
    ///
    /// Returns:
    /// - `Ok(())`: If credentials are valid.
    /// - `Err(u16)`: The HTTP status code if credentials are invalid, 0 for network errors.
    fn test_canvas_credentials(&self) -> Result<(), u16> {
        let client = reqwest::blocking::Client::new();
        let res = client
            .get(self.endpoint("users/self"))
            .bearer_auth(&self.token_canvas)
            .send();

        match res {
            Ok(response) if response.status().is_success() => Ok(()),
            Ok(response) => Err(response.status().as_u16()),
            Err(_) => Err(0),
        }
    }

    /// Loads credentials from `CANVAS_URL` and `CANVAS_TOKEN`.
    pub fn load_credentials_from_env() -> Result<CanvasCredentials, String> {
        let url = std::env::var("CANVAS_URL")
            .map_err(|_| "Error retrieving URL from environment".to_string())?;
        let token = std::env::var("CANVAS_TOKEN")
            .map_err(|_| "Error retrieving token from environment".to_string())?;
        log::info!("Credentials loaded from environment -> {}", url);
        Ok(CanvasCredentials::new(&url, &token))
    }

    /// Loads Canvas credentials from the system's keyring.
    ///
    /// Returns:
    /// - `Ok(CanvasCredentials)`: Credentials if successfully retrieved.
    /// - `Err(String)`: Error message if the keyring cannot be read.
    pub fn load_credentials_from_system() -> Result<CanvasCredentials, String> {
        let app_name = env!("CARGO_PKG_NAME");
        let url = Entry::new(app_name, URL_KEY)
            .and_then(|entry| entry.get_password())
            .map_err(|_| "Error retrieving URL from system".to_string())?;
        let token = Entry::new(app_name, TOKEN_KEY)
            .and_then(|entry| entry.get_password())
            .map_err(|_| "Error retrieving token from system".to_string())?;
        Ok(CanvasCredentials::new(&url, &token))
    }

    fn load_credentials() -> CanvasCredentialType {
        match Self::load_credentials_from_env() {
            Ok(credentials) => CanvasCredentialType::EnvVariables(credentials),
            Err(_) => match Self::load_credentials_from_system() {
                Ok(credentials) => CanvasCredentialType::SystemKeyring(credentials),
                Err(_) => CanvasCredentialType::None,
            },
        }
    }

    /// Interactively asks for credentials and stores them in the system keyring.
    ///
    /// Loops until the entered credentials pass validation, the user declines,
    /// or Canvas answers with something other than 401/403.
    fn set_system_credentials() -> Result<CanvasCredentials, GraderError> {
        let app_name = env!("CARGO_PKG_NAME");
        let theme = ColorfulTheme::default();
        loop {
            let register = Confirm::with_theme(&theme)
                .with_prompt("Do you wish to register the Canvas credentials?")
                .default(true)
                .interact()
                .map_err(|e| GraderError::Interaction(e.to_string()))?;
            if !register {
                return Err(GraderError::Credentials(
                    "no credentials available".to_string(),
                ));
            }

            let url: String = Input::with_theme(&theme)
                .with_prompt("Canvas API URL (e.g. https://school.instructure.com/api/v1)")
                .interact_text()
                .map_err(|e| GraderError::Interaction(e.to_string()))?;
            let token = Password::with_theme(&theme)
                .with_prompt("Canvas token")
                .interact()
                .map_err(|e| GraderError::Interaction(e.to_string()))?;
            let credentials = CanvasCredentials::new(&url, &token);

            match credentials.test_canvas_credentials() {
                Ok(()) => {}
                Err(status_code) if status_code == 401 || status_code == 403 => {
                    eprintln!("Incorrect credentials");
                    continue;
                }
                Err(status_code) => {
                    return Err(GraderError::Credentials(format!(
                        "error accessing Canvas API - status code {}",
                        status_code
                    )));
                }
            }

            for (key, value) in [
                (URL_KEY, &credentials.url_canvas),
                (TOKEN_KEY, &credentials.token_canvas),
            ] {
                if let Err(e) = Entry::new(app_name, key).and_then(|entry| entry.set_password(value))
                {
                    log::warn!("could not store {} in keyring: {}", key, e);
                }
            }
            return Ok(credentials);
        }
    }

    /// Retrieves Canvas credentials, using stored ones or prompting for new ones.
    ///
    /// Order: environment variables, then the system keyring, then an
    /// interactive prompt. Stored credentials are validated before use.
    pub fn credentials() -> Result<CanvasCredentials, GraderError> {
        match Self::load_credentials() {
            CanvasCredentialType::None => Self::set_system_credentials(),
            CanvasCredentialType::EnvVariables(credentials)
            | CanvasCredentialType::SystemKeyring(credentials) => {
                match credentials.test_canvas_credentials() {
                    Ok(()) => Ok(credentials),
                    Err(e) => Err(GraderError::Credentials(format!(
                        "error accessing Canvas API - status code {}",
                        e
                    ))),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canvas_credentials_initialization() {
        let credentials = CanvasCredentials::new(" https://example.com/api/v1/ ", "secret-token\n");

        assert_eq!(credentials.url_canvas, "https://example.com/api/v1");
        assert_eq!(credentials.token_canvas, "secret-token");
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        let credentials = CanvasCredentials::new("https://example.com/api/v1", "t");
        assert_eq!(
            credentials.endpoint("/courses/1/assignments/2"),
            "https://example.com/api/v1/courses/1/assignments/2"
        );
        assert_eq!(
            credentials.endpoint("users/self"),
            "https://example.com/api/v1/users/self"
        );
    }
}

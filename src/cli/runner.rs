//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands};
use crate::config::ClientConfig;
use crate::error::{Error, Result, ResultExt};
use crate::http::{HttpClient, Operation};
use crate::types::{JsonValue, Method};
use serde::Serialize;
use serde_json::json;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let client = HttpClient::new(self.load_config()?)?;

        match &self.cli.command {
            Commands::Token => self.token(&client).await,
            Commands::GetMember { userid } => {
                let user = client.address_book().get_member(userid).await?;
                self.output(&user)
            }
            Commands::DeleteMember { userid } => {
                client.address_book().delete_member(userid).await?;
                self.output(&json!({"deleted": userid}))
            }
            Commands::Invite { userids } => {
                let result = client.address_book().invite_members(userids).await?;
                self.output(&result)
            }
            Commands::Departments { id } => {
                let departments = client.address_book().department_list(*id).await?;
                self.output(&departments)
            }
            Commands::Call {
                method,
                path,
                query,
                body,
            } => {
                let operation = build_operation(*method, path, query, body.as_deref())?;
                let response: JsonValue = client.execute(operation).await?;
                self.output(&response)
            }
        }
    }

    /// Resolve the client config: file, then environment, then flags
    fn load_config(&self) -> Result<ClientConfig> {
        self.load_config_with(|key| std::env::var(key).ok())
    }

    fn load_config_with<F: Fn(&str) -> Option<String>>(&self, lookup: F) -> Result<ClientConfig> {
        let mut config = match &self.cli.config {
            Some(path) => ClientConfig::from_file(path)?,
            None => ClientConfig::default(),
        }
        .with_vars(lookup);

        if let Some(corp_id) = &self.cli.corp_id {
            config.enterprise_id.clone_from(corp_id);
        }
        if let Some(secret) = &self.cli.corp_secret {
            config.agent_secret.clone_from(secret);
        }
        if let Some(base_url) = &self.cli.base_url {
            config.base_url.clone_from(base_url);
        }
        if let Some(attempts) = self.cli.max_attempts {
            config.max_attempts = attempts;
        }
        if self.cli.verbose {
            config.print_payload = true;
        }

        config.validate()?;
        Ok(config)
    }

    async fn token(&self, client: &HttpClient) -> Result<()> {
        let credential = client.refresh_access_token().await?;
        self.output(&json!({
            "access_token": credential.token,
            "expires_at": credential.expires_at.map(|at| at.to_rfc3339()),
        }))
    }

    /// Print a value as pretty JSON
    fn output<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let text = serde_json::to_string_pretty(value).context("Failed to format output")?;
        println!("{text}");
        Ok(())
    }
}

fn build_operation(
    method: Method,
    path: &str,
    query: &[(String, String)],
    body: Option<&str>,
) -> Result<Operation> {
    let mut operation = query
        .iter()
        .fold(Operation::new(method, path), |op, (key, value)| {
            op.query(key.as_str(), value.as_str())
        });

    if let Some(body) = body {
        let value: JsonValue = serde_json::from_str(body)
            .map_err(|e| Error::config(format!("Invalid --body JSON: {e}")))?;
        operation = operation.json(value);
    }
    Ok(operation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ENV_BASE_URL, ENV_CORP_ID, ENV_CORP_SECRET};
    use clap::Parser;
    use std::collections::HashMap;
    use std::io::Write;

    fn runner(args: &[&str]) -> Runner {
        Runner::new(Cli::parse_from(args))
    }

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_flags_override_env_and_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "enterprise_id: from-file\nagent_secret: file-secret\nbase_url: http://file.test\nmax_attempts: 2"
        )
        .unwrap();
        let path = file.path().to_str().unwrap();

        let runner = runner(&["wecom", "--config", path, "--corp-id", "from-flag", "token"]);
        let config = runner
            .load_config_with(env(&[
                (ENV_CORP_ID, "from-env"),
                (ENV_CORP_SECRET, "env-secret"),
            ]))
            .unwrap();

        assert_eq!(config.enterprise_id, "from-flag");
        assert_eq!(config.agent_secret, "env-secret");
        assert_eq!(config.base_url, "http://file.test");
        assert_eq!(config.max_attempts, 2);
    }

    #[test]
    fn test_env_only() {
        let runner = runner(&["wecom", "--max-attempts", "4", "token"]);
        let config = runner
            .load_config_with(env(&[
                (ENV_CORP_ID, "ww-env"),
                (ENV_CORP_SECRET, "secret"),
                (ENV_BASE_URL, "http://env.test"),
            ]))
            .unwrap();

        assert_eq!(config.enterprise_id, "ww-env");
        assert_eq!(config.base_url, "http://env.test");
        assert_eq!(config.max_attempts, 4);
    }

    #[test]
    fn test_missing_secret_is_rejected() {
        let runner = runner(&["wecom", "--corp-id", "ww1", "token"]);
        let err = runner.load_config_with(env(&[])).unwrap_err();
        assert!(matches!(err, Error::MissingConfigField { .. }));
    }

    #[test]
    fn test_build_operation() {
        let query = vec![("userid".to_string(), "zhangsan".to_string())];
        let op = build_operation(
            Method::POST,
            "/cgi-bin/user/update",
            &query,
            Some(r#"{"name":"张三"}"#),
        )
        .unwrap();

        assert_eq!(op.method, Method::POST);
        assert_eq!(op.query, query);
        assert_eq!(op.body, Some(json!({"name": "张三"})));
    }

    #[test]
    fn test_build_operation_rejects_bad_body() {
        let err = build_operation(Method::POST, "/x", &[], Some("{not json")).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }
}

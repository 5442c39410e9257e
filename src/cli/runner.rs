//! CLI runner - executes commands

use crate::auth::AuthConfig;
use crate::cli::commands::{Cli, Commands, QueryArgs};
use crate::config::SkillConfig;
use crate::error::{Error, Result, ResultExt};
use crate::http::{GraphqlRequest, RequestEngine, RequestOptions};
use crate::pagination::PaginationWalker;
use crate::types::{JsonObject, JsonValue};
use serde::Serialize;
use serde_json::json;
use std::fs;
use std::time::Duration;
use tracing::{debug, info};

/// Endpoint and credential a command runs against
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    /// Endpoint URL
    pub endpoint: String,
    /// Account name, when one was resolved
    pub account: Option<String>,
    /// Credential
    pub auth: AuthConfig,
}

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
        let config = self.load_config()?;

        match &self.cli.command {
            Commands::Query { query } => self.query(&config, query).await,
            Commands::Paginate {
                query,
                collection_path,
                page_size,
                max_pages,
                strict,
            } => {
                self.paginate(
                    &config,
                    query,
                    collection_path,
                    *page_size,
                    *max_pages,
                    *strict,
                )
                .await
            }
            Commands::Accounts => self.emit(&json!({
                "default": config.accounts.default,
                "accounts": config.accounts.names(),
            })),
            Commands::Environments => self.emit(&json!({
                "default": config.default_environment,
                "environments": config.environments,
            })),
        }
    }

    fn load_config(&self) -> Result<SkillConfig> {
        match &self.cli.config {
            Some(path) => SkillConfig::load(path),
            None => Ok(SkillConfig::default()),
        }
    }

    /// Pick the endpoint and credential.
    ///
    /// Credential: `--credential`, else the resolved account, else none.
    /// Endpoint: `--endpoint`, else `--env`, else the account's endpoint,
    /// else the default environment.
    pub fn resolve_target<F>(&self, config: &SkillConfig, lookup: F) -> Result<Target>
    where
        F: Fn(&str) -> Option<String>,
    {
        let (account, auth, account_endpoint) = if let Some(credential) = &self.cli.credential {
            (
                None,
                AuthConfig::from_scheme(self.cli.auth_scheme, credential.clone(), None),
                None,
            )
        } else if !config.accounts.is_empty() {
            let (name, entry) = config
                .accounts
                .resolve(self.cli.account.as_deref(), self.cli.infer_account.as_deref())?;
            (
                Some(name.to_string()),
                entry.auth_config(name, lookup)?,
                entry.endpoint.clone(),
            )
        } else if let Some(selector) = &self.cli.account {
            return Err(Error::UnknownAccount {
                selector: selector.clone(),
                available: Vec::new(),
            });
        } else {
            (None, AuthConfig::None, None)
        };

        let endpoint = match (&self.cli.endpoint, &self.cli.env, account_endpoint) {
            (Some(endpoint), _, _) => endpoint.clone(),
            (None, Some(env), _) => config.endpoint(Some(env))?,
            (None, None, Some(endpoint)) => endpoint,
            (None, None, None) => config.endpoint(None)?,
        };

        Ok(Target {
            endpoint,
            account,
            auth,
        })
    }

    fn request_options(&self) -> RequestOptions {
        let mut options = RequestOptions::new().verbose(self.cli.verbose);
        if let Some(retries) = self.cli.max_retries {
            options = options.retries(retries);
        }
        if let Some(secs) = self.cli.deadline {
            options = options.timeout(Duration::from_secs(secs));
        }
        options
    }

    fn engine(&self, config: &SkillConfig) -> Result<(Target, RequestEngine)> {
        let target = self.resolve_target(config, |var| std::env::var(var).ok())?;
        debug!(
            "Using endpoint {} (account: {})",
            target.endpoint,
            target.account.as_deref().unwrap_or("-")
        );
        let engine = RequestEngine::new(config.engine_config(), target.auth.clone())?;
        Ok((target, engine))
    }

    async fn query(&self, config: &SkillConfig, args: &QueryArgs) -> Result<()> {
        let (target, engine) = self.engine(config)?;
        let request = GraphqlRequest::new(target.endpoint, read_query(args)?)
            .with_variables(parse_variables(args.variables.as_deref())?);

        let response = engine.execute(&request, &self.request_options()).await?;

        if let Some(cost) = &response.cost {
            info!("Query cost: {}", cost);
        }

        self.emit(&response.body)?;

        let errors = response.errors();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Application { errors })
        }
    }

    async fn paginate(
        &self,
        config: &SkillConfig,
        args: &QueryArgs,
        collection_path: &str,
        page_size: Option<u32>,
        max_pages: Option<u32>,
        strict: bool,
    ) -> Result<()> {
        let (target, engine) = self.engine(config)?;
        let query = read_query(args)?;
        let variables = parse_variables(args.variables.as_deref())?;

        let mut options = config.pagination_options();
        options.request = self.request_options();
        if let Some(size) = page_size {
            options = options.page_size(size);
        }
        if let Some(max) = max_pages {
            options = options.max_pages(max);
        }

        let walker = PaginationWalker::new(engine);
        let collection = walker
            .fetch_all_pages(&target.endpoint, &query, collection_path, &variables, &options)
            .await?;

        if strict && collection.truncated {
            return Err(Error::Other(format!(
                "'{collection_path}' stopped at max_pages ({} pages, {} items); result is incomplete",
                collection.pages,
                collection.len()
            )));
        }

        self.emit(&collection)
    }

    fn emit<T: Serialize>(&self, value: &T) -> Result<()> {
        let text = if self.cli.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        println!("{text}");
        Ok(())
    }
}

fn read_query(args: &QueryArgs) -> Result<String> {
    match (&args.query, &args.query_file) {
        (Some(query), _) => Ok(query.clone()),
        (None, Some(path)) => {
            if !path.exists() {
                return Err(Error::FileNotFound {
                    path: path.display().to_string(),
                });
            }
            fs::read_to_string(path)
                .with_context(|| format!("Failed to read query file {}", path.display()))
        }
        (None, None) => Err(Error::invalid_request("a query or --query-file is required")),
    }
}

/// Parse `--variables`; absent means an empty object
pub fn parse_variables(raw: Option<&str>) -> Result<JsonObject> {
    match raw {
        None => Ok(JsonObject::new()),
        Some(text) => match serde_json::from_str::<JsonValue>(text)? {
            JsonValue::Object(map) => Ok(map),
            _ => Err(Error::invalid_value(
                "--variables",
                "must be a JSON object",
            )),
        },
    }
}

//! Per-domain prompt templates.
//!
//! Templates are minijinja sources with a `{{ question }}` placeholder. The
//! built-in set is compiled into the binary; a template directory can override
//! any of them, and edits to that directory are picked up without a restart.

use std::path::PathBuf;

use minijinja::{context, path_loader, Environment};
use minijinja_autoreload::AutoReloader;
use tracing::{debug, error, info};

use crate::domain::Domain;
use crate::error::ConfigError;

const QUESTION_PROBE: &str = "__jivan_question_probe__";

fn builtin_source(name: &str) -> Option<&'static str> {
    match name {
        "hindu.txt" => Some(include_str!("../templates/hindu.txt")),
        "muslim.txt" => Some(include_str!("../templates/muslim.txt")),
        "sikh.txt" => Some(include_str!("../templates/sikh.txt")),
        "christian.txt" => Some(include_str!("../templates/christian.txt")),
        _ => None,
    }
}

fn builtin_env() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_loader(|name| Ok(builtin_source(name).map(str::to_owned)));
    env
}

lazy_static::lazy_static! {
    static ref BUILTIN_ENV: Environment<'static> = builtin_env();
}

fn render(env: &Environment<'_>, domain: Domain, question: &str) -> Result<String, minijinja::Error> {
    env.get_template(domain.template_name())?
        .render(context! { question => question })
}

pub struct PromptComposer {
    templates: AutoReloader,
    source_dir: Option<PathBuf>,
}

impl PromptComposer {
    /// Composer backed only by the compiled-in templates.
    pub fn builtin() -> Self {
        Self {
            templates: AutoReloader::new(|_notifier| Ok(builtin_env())),
            source_dir: None,
        }
    }

    /// Composer reading `<domain>.txt` files from `dir`. Domains without a
    /// file in `dir` keep their built-in template. Every template is rendered
    /// once up front so a broken file fails at startup.
    pub fn from_dir(dir: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let dir = dir.into();
        std::fs::read_dir(&dir).map_err(|source| ConfigError::TemplateDir {
            path: dir.clone(),
            source,
        })?;

        let watched = dir.clone();
        let templates = AutoReloader::new(move |notifier| {
            let fs_loader = path_loader(watched.clone());
            let mut env = Environment::new();
            env.set_loader(move |name| match fs_loader(name)? {
                Some(source) => Ok(Some(source)),
                None => Ok(builtin_source(name).map(str::to_owned)),
            });
            notifier.watch_path(&watched, true);
            Ok(env)
        });

        let composer = Self {
            templates,
            source_dir: Some(dir),
        };
        composer.validate()?;
        info!(dir = ?composer.source_dir, "Loaded prompt templates");
        Ok(composer)
    }

    pub fn source_dir(&self) -> Option<&PathBuf> {
        self.source_dir.as_ref()
    }

    /// Renders every domain's template with a probe question and checks the
    /// question comes through verbatim.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let env = self.templates.acquire_env().map_err(|source| ConfigError::Template {
            name: "<environment>".to_string(),
            source,
        })?;
        for domain in Domain::ALL {
            let name = domain.template_name();
            let rendered = render(&env, domain, QUESTION_PROBE).map_err(|source| ConfigError::Template {
                name: name.to_string(),
                source,
            })?;
            if !rendered.contains(QUESTION_PROBE) {
                return Err(ConfigError::TemplateMissingQuestion {
                    name: name.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Builds the full instruction for `domain` with `user_text` appended.
    ///
    /// Never fails: a template that breaks after startup (for example an edit
    /// on disk) falls back to the built-in template for that domain. The
    /// caller is expected to reject empty input beforehand.
    pub fn compose(&self, domain: Domain, user_text: &str) -> String {
        let rendered = self
            .templates
            .acquire_env()
            .and_then(|env| render(&env, domain, user_text));

        let prompt = match rendered {
            Ok(prompt) => prompt,
            Err(e) => {
                error!(%domain, error = %e, "Prompt template failed, using built-in template");
                render(&BUILTIN_ENV, domain, user_text)
                    .unwrap_or_else(|_| format!("User Question: {}", user_text))
            }
        };
        debug!(%domain, prompt_len = prompt.len(), "Composed prompt");
        prompt
    }

    /// Same as [`compose`](Self::compose) for an untyped selector; unknown
    /// selectors use the default domain's template.
    pub fn compose_selector(&self, selector: &str, user_text: &str) -> String {
        self.compose(Domain::from_selector(selector), user_text)
    }
}

impl Default for PromptComposer {
    fn default() -> Self {
        Self::builtin()
    }
}

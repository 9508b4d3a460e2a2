//! Sling-style content server transport.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use url::Url;

use repotree_core::{Error as CoreError, NodePath, Properties, PropsPolicy, Transport, Value};

use crate::Error;

/// Connection settings for a [`SlingTransport`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlingConfig {
    /// Base URL of the instance, e.g. `http://localhost:4502`.
    pub url: String,
    pub user: String,
    pub password: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
    /// Extra property names ignored when comparing, on top of the JCR protected set.
    pub ignored_props: Vec<String>,
}

impl Default for SlingConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:4502".to_string(),
            user: "admin".to_string(),
            password: "admin".to_string(),
            timeout_secs: 30,
            ignored_props: Vec::new(),
        }
    }
}

/// Blocking transport talking to the Sling GET and POST servlets.
///
/// Every call is a fresh request; nothing is cached between calls.
pub struct SlingTransport {
    client: Client,
    base_url: Url,
    user: String,
    password: String,
    policy: PropsPolicy,
}

impl SlingTransport {
    /// Create a transport for the given instance.
    pub fn new(config: &SlingConfig) -> Result<Self, Error> {
        let base_url = Url::parse(&config.url)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let policy = PropsPolicy::default().with_excluded(config.ignored_props.iter().cloned());

        Ok(Self {
            client,
            base_url,
            user: config.user.clone(),
            password: config.password.clone(),
            policy,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build the URL of a node, optionally with a selector/extension suffix
    /// on its last segment. Names are percent-encoded segment by segment.
    fn node_url(&self, path: &NodePath, suffix: &str) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| Error::InvalidBaseUrl {
                url: self.base_url.to_string(),
            })?;
            segments.pop_if_empty();
            if path.is_root() {
                segments.push(suffix);
            } else {
                let mut names = path.as_str()[1..].split('/').peekable();
                while let Some(name) = names.next() {
                    if names.peek().is_none() {
                        segments.push(&format!("{}{}", name, suffix));
                    } else {
                        segments.push(name);
                    }
                }
            }
        }
        Ok(url)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.basic_auth(&self.user, Some(&self.password))
    }

    /// GET a JSON rendering of a node. `None` on 404.
    fn get_json(
        &self,
        path: &NodePath,
        suffix: &str,
    ) -> Result<Option<serde_json::Map<String, serde_json::Value>>, Error> {
        let url = self.node_url(path, suffix)?;
        tracing::debug!(%url, "GET");
        let response = self.authorized(self.client.get(url.clone())).send()?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check_status(response, &url)?;
        match response.json::<serde_json::Value>()? {
            serde_json::Value::Object(map) => Ok(Some(map)),
            other => Err(Error::UnexpectedBody {
                url: url.to_string(),
                message: format!("expected a JSON object, got {}", other),
            }),
        }
    }

    fn post_form(&self, path: &NodePath, form: &[(String, String)]) -> Result<(), Error> {
        let url = self.node_url(path, "")?;
        tracing::debug!(%url, fields = form.len(), "POST");
        let response = self
            .authorized(self.client.post(url.clone()))
            .form(form)
            .send()?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::Core(CoreError::not_found(path)));
        }
        check_status(response, &url)?;
        Ok(())
    }
}

fn check_status(response: Response, url: &Url) -> Result<Response, Error> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(Error::Status {
            status: response.status().as_u16(),
            url: url.to_string(),
        })
    }
}

/// Sling type hint for a value kind.
fn type_hint(value: &Value) -> Option<&'static str> {
    match value {
        Value::Bool(_) => Some("Boolean"),
        Value::Integer(_) => Some("Long"),
        Value::Float(_) => Some("Double"),
        _ => None,
    }
}

/// Encode properties as Sling POST servlet form fields.
fn form_fields(props: &Properties) -> Result<Vec<(String, String)>, CoreError> {
    let mut form = vec![("_charset_".to_string(), "utf-8".to_string())];
    for (name, value) in props {
        match value {
            Value::Null => form.push((format!("{}@Delete", name), String::new())),
            Value::Bytes(_) => {
                return Err(CoreError::Unsupported {
                    operation: "save binary property",
                })
            }
            Value::Array(items) => {
                let hint = items.first().and_then(type_hint).unwrap_or("String");
                form.push((format!("{}@TypeHint", name), format!("{}[]", hint)));
                for item in items {
                    form.push((name.clone(), item.to_string()));
                }
            }
            scalar => {
                if let Some(hint) = type_hint(scalar) {
                    form.push((format!("{}@TypeHint", name), hint.to_string()));
                }
                form.push((name.clone(), scalar.to_string()));
            }
        }
    }
    Ok(form)
}

impl Transport for SlingTransport {
    fn exists(&self, path: &NodePath) -> Result<bool, CoreError> {
        Ok(self.get_json(path, ".json")?.is_some())
    }

    fn read(&self, path: &NodePath) -> Result<Properties, CoreError> {
        let Some(map) = self.get_json(path, ".json")? else {
            return Ok(Properties::new());
        };
        Ok(map
            .into_iter()
            .filter_map(|(name, json)| Value::from_json(json).map(|value| (name, value)))
            .collect())
    }

    fn save(&self, path: &NodePath, props: &Properties) -> Result<(), CoreError> {
        let form = form_fields(props)?;
        self.post_form(path, &form)?;
        tracing::info!(path = %path, props = props.len(), "saved node");
        Ok(())
    }

    fn delete(&self, path: &NodePath) -> Result<(), CoreError> {
        let form = vec![(":operation".to_string(), "delete".to_string())];
        self.post_form(path, &form)?;
        tracing::info!(path = %path, "deleted node");
        Ok(())
    }

    fn props_equal(&self, current: &Properties, desired: &Properties) -> bool {
        self.policy.satisfies(current, desired)
    }

    fn child_names(&self, path: &NodePath) -> Result<Vec<String>, CoreError> {
        let map = self
            .get_json(path, ".1.json")?
            .ok_or_else(|| CoreError::not_found(path))?;
        Ok(map
            .into_iter()
            .filter(|(_, json)| json.is_object())
            .map(|(name, _)| name)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use collection_literals::btree;
    use repotree_core::node_path;

    fn transport(url: &str) -> SlingTransport {
        SlingTransport::new(&SlingConfig {
            url: url.to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_node_url() {
        let repo = transport("http://localhost:4502/");
        let url = repo.node_url(&node_path!("/content/a"), ".json").unwrap();
        assert_eq!(url.as_str(), "http://localhost:4502/content/a.json");

        let url = repo.node_url(&NodePath::root(), ".1.json").unwrap();
        assert_eq!(url.as_str(), "http://localhost:4502/.1.json");

        let url = repo.node_url(&node_path!("/content/a"), "").unwrap();
        assert_eq!(url.as_str(), "http://localhost:4502/content/a");

        let url = repo.node_url(&NodePath::root(), "").unwrap();
        assert_eq!(url.as_str(), "http://localhost:4502/");
    }

    #[test]
    fn test_node_url_with_context_path() {
        let repo = transport("http://localhost:4502/author");
        let url = repo
            .node_url(&node_path!("/content/a/jcr:content"), ".json")
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:4502/author/content/a/jcr:content.json");
    }

    #[test]
    fn test_node_url_encodes_names() {
        let repo = transport("http://localhost:4502");
        let url = repo.node_url(&node_path!("/content/a#b?c d"), ".json").unwrap();
        assert_eq!(url.as_str(), "http://localhost:4502/content/a%23b%3Fc%20d.json");
        assert_eq!(url.fragment(), None);
        assert_eq!(url.query(), None);
    }

    #[test]
    fn test_opaque_base_url_is_rejected() {
        let repo = transport("mailto:admin@example.com");
        assert!(matches!(
            repo.node_url(&node_path!("/content"), ".json"),
            Err(Error::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn form_fields_carry_type_hints() {
        let props: Properties = btree! {
            "title".into() => Value::from("Hello"),
            "count".into() => Value::from(3i64),
            "hidden".into() => Value::Bool(true),
            "tags".into() => Value::from(vec!["a", "b"]),
            "obsolete".into() => Value::Null,
        };
        let form = form_fields(&props).unwrap();
        let has = |k: &str, v: &str| form.iter().any(|(fk, fv)| fk == k && fv == v);

        assert!(has("_charset_", "utf-8"));
        assert!(has("title", "Hello"));
        assert!(has("count@TypeHint", "Long"));
        assert!(has("count", "3"));
        assert!(has("hidden@TypeHint", "Boolean"));
        assert!(has("tags@TypeHint", "String[]"));
        assert!(has("tags", "a"));
        assert!(has("tags", "b"));
        assert!(has("obsolete@Delete", ""));
    }

    #[test]
    fn binary_values_are_rejected() {
        let props: Properties = btree! { "data".into() => Value::Bytes(vec![1, 2]) };
        assert!(matches!(
            form_fields(&props),
            Err(CoreError::Unsupported { .. })
        ));
    }

    #[test]
    fn ignored_props_extend_the_default_policy() {
        let repo = SlingTransport::new(&SlingConfig {
            ignored_props: vec!["cq:lastReplicated".to_string()],
            ..Default::default()
        })
        .unwrap();
        let current: Properties = btree! {
            "title".into() => Value::from("x"),
            "cq:lastReplicated".into() => Value::from("yesterday"),
            "jcr:created".into() => Value::from("today"),
        };
        let desired: Properties = btree! {
            "title".into() => Value::from("x"),
            "cq:lastReplicated".into() => Value::from("never"),
        };
        assert!(repo.props_equal(&current, &desired));
        assert!(!transport("http://localhost:4502").props_equal(&current, &desired));
    }
}

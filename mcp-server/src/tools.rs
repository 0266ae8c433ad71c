//! Tool declarations for the Veridictum API and the tool -> request mapping.

use serde::Serialize;
use serde_json::{json, Map, Value};
use thiserror::Error;

pub const MAX_BULK_CITATIONS: usize = 50;

/// Tool Definition
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

#[cfg(test)]
impl ToolDescriptor {
    fn required(&self) -> Vec<&str> {
        self.input_schema
            .get("required")
            .and_then(|r| r.as_array())
            .map(|r| r.iter().filter_map(|v| v.as_str()).collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    SetupApiKey,
    VerifyCitation,
    VerifyBulkCitations,
    SearchCases,
    CheckHallucinations,
}

impl ToolKind {
    pub const ALL: [ToolKind; 5] = [
        ToolKind::SetupApiKey,
        ToolKind::VerifyCitation,
        ToolKind::VerifyBulkCitations,
        ToolKind::SearchCases,
        ToolKind::CheckHallucinations,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ToolKind::SetupApiKey => "setup_api_key",
            ToolKind::VerifyCitation => "verify_citation",
            ToolKind::VerifyBulkCitations => "verify_bulk_citations",
            ToolKind::SearchCases => "search_cases",
            ToolKind::CheckHallucinations => "check_hallucinations",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Tools that run locally instead of being forwarded to the API.
    pub fn is_setup(self) -> bool {
        self == ToolKind::SetupApiKey
    }

    pub fn descriptor(self) -> ToolDescriptor {
        let (description, input_schema) = match self {
            ToolKind::SetupApiKey => (
                "Save your Veridictum API key for citation verification. \
                 This is a one-time setup. Get your free API key at \
                 https://veridictum.legal/dashboard. Your key is stored \
                 securely on your local machine at ~/.veridictum/config.json \
                 and is never shared with anyone.",
                json!({
                    "type": "object",
                    "properties": {
                        "api_key": {
                            "type": "string",
                            "description": "Your Veridictum API key from https://veridictum.legal/dashboard"
                        }
                    },
                    "required": ["api_key"]
                }),
            ),
            ToolKind::VerifyCitation => (
                "Verify a single legal citation against Veridictum's database of \
                 14.2 million real court cases. Returns verification status, case name, \
                 court, date decided, and CourtListener URL. Use this BEFORE citing any \
                 case in legal writing to ensure it is real. \
                 If the tool returns an API key error, guide the user through setup.",
                json!({
                    "type": "object",
                    "properties": {
                        "citation": {
                            "type": "string",
                            "description": "Legal citation in Bluebook format (e.g., '384 U.S. 436' or 'Miranda v. Arizona, 384 U.S. 436 (1966)')"
                        }
                    },
                    "required": ["citation"]
                }),
            ),
            ToolKind::VerifyBulkCitations => (
                "Verify multiple legal citations at once against Veridictum's database. \
                 Returns verification status for each citation plus an overall hallucination \
                 risk level (LOW/MEDIUM/HIGH). Maximum 50 citations per request.",
                json!({
                    "type": "object",
                    "properties": {
                        "citations": {
                            "type": "array",
                            "items": { "type": "string" },
                            "maxItems": MAX_BULK_CITATIONS,
                            "description": "List of legal citations to verify (max 50)"
                        }
                    },
                    "required": ["citations"]
                }),
            ),
            ToolKind::SearchCases => (
                "Search Veridictum's database of 14.2 million court cases by topic, \
                 keyword, case name, or legal principle. Returns verified cases with \
                 full citations, court info, and CourtListener links. Use this to find \
                 real cases to support legal arguments.",
                json!({
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "Search query: legal topic, keywords, case name, or legal principle"
                        },
                        "limit": {
                            "type": "integer",
                            "description": "Maximum number of results (1-20, default 5)",
                            "default": 5
                        }
                    },
                    "required": ["query"]
                }),
            ),
            ToolKind::CheckHallucinations => (
                "Scan a legal document for hallucinated citations. Extracts all citations \
                 from the text, verifies each one against Veridictum's database, and returns \
                 a hallucination risk assessment (SAFE/LOW/MEDIUM/HIGH). Use this BEFORE \
                 filing or submitting any legal document.",
                json!({
                    "type": "object",
                    "properties": {
                        "text": {
                            "type": "string",
                            "description": "Full text of the legal document to analyze"
                        }
                    },
                    "required": ["text"]
                }),
            ),
        };

        ToolDescriptor {
            name: self.name().to_string(),
            description: description.to_string(),
            input_schema,
        }
    }

    /// Map validated arguments onto the single API request this tool issues.
    /// `None` for the setup tool, which is handled locally.
    pub fn request(self, args: &Map<String, Value>) -> Result<Option<ApiRequest>, ArgumentError> {
        let request = match self {
            ToolKind::SetupApiKey => return Ok(None),
            ToolKind::VerifyCitation => ApiRequest::Post {
                path: "/verify",
                body: json!({ "citation": required_str(args, "citation")? }),
            },
            ToolKind::VerifyBulkCitations => ApiRequest::Post {
                path: "/verify/bulk",
                body: json!({ "citations": citation_list(args)? }),
            },
            ToolKind::SearchCases => {
                let mut query = vec![("q".to_string(), required_str(args, "query")?.to_string())];
                if let Some(limit) = args.get("limit").filter(|v| !v.is_null()) {
                    let limit = limit.as_i64().ok_or(ArgumentError::WrongType {
                        field: "limit",
                        expected: "an integer",
                    })?;
                    query.push(("limit".to_string(), limit.to_string()));
                }
                ApiRequest::Get { path: "/search", query }
            }
            ToolKind::CheckHallucinations => ApiRequest::Post {
                path: "/hallucination-check",
                body: json!({ "text": required_str(args, "text")? }),
            },
        };
        Ok(Some(request))
    }
}

/// Declared tools for the given deployment mode.
pub fn tool_descriptors(setup_enabled: bool) -> Vec<ToolDescriptor> {
    ToolKind::ALL
        .into_iter()
        .filter(|kind| setup_enabled || !kind.is_setup())
        .map(ToolKind::descriptor)
        .collect()
}

/// One outbound request against the API base URL.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiRequest {
    Get {
        path: &'static str,
        query: Vec<(String, String)>,
    },
    Post {
        path: &'static str,
        body: Value,
    },
}

impl ApiRequest {
    pub fn path(&self) -> &'static str {
        match self {
            ApiRequest::Get { path, .. } | ApiRequest::Post { path, .. } => *path,
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("missing required argument '{0}'")]
    Missing(&'static str),
    #[error("argument '{field}' must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("'citations' must contain between 1 and {max} entries (got {0})", max = MAX_BULK_CITATIONS)]
    CitationCount(usize),
}

pub fn required_str<'a>(
    args: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, ArgumentError> {
    match args.get(field) {
        None | Some(Value::Null) => Err(ArgumentError::Missing(field)),
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(_) => Err(ArgumentError::WrongType {
            field,
            expected: "a string",
        }),
    }
}

fn citation_list(args: &Map<String, Value>) -> Result<Vec<&str>, ArgumentError> {
    let items = match args.get("citations") {
        None | Some(Value::Null) => return Err(ArgumentError::Missing("citations")),
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(ArgumentError::WrongType {
                field: "citations",
                expected: "an array of strings",
            })
        }
    };

    if items.is_empty() || items.len() > MAX_BULK_CITATIONS {
        return Err(ArgumentError::CitationCount(items.len()));
    }

    items
        .iter()
        .map(|v| {
            v.as_str().ok_or(ArgumentError::WrongType {
                field: "citations",
                expected: "an array of strings",
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn file_mode_declares_five_tools() {
        let tools = tool_descriptors(true);
        assert_eq!(tools.len(), 5);
        assert_eq!(tools[0].name, "setup_api_key");
    }

    #[test]
    fn env_mode_hides_setup_tool() {
        let names: Vec<_> = tool_descriptors(false).into_iter().map(|t| t.name).collect();
        assert_eq!(
            names,
            vec!["verify_citation", "verify_bulk_citations", "search_cases", "check_hallucinations"]
        );
    }

    #[test]
    fn every_descriptor_is_complete() {
        for tool in tool_descriptors(true) {
            assert!(!tool.name.is_empty());
            assert!(!tool.description.is_empty());
            assert_eq!(tool.input_schema["type"], "object");
            assert!(!tool.required().is_empty(), "{} has no required fields", tool.name);
        }
    }

    #[test]
    fn descriptor_serializes_camel_case_schema() {
        let value = serde_json::to_value(ToolKind::SearchCases.descriptor()).unwrap();
        assert!(value.get("inputSchema").is_some());
        assert_eq!(value["inputSchema"]["properties"]["limit"]["default"], 5);
    }

    #[test]
    fn name_round_trip() {
        for kind in ToolKind::ALL {
            assert_eq!(ToolKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ToolKind::from_name("delete_everything"), None);
    }

    #[test]
    fn verify_citation_posts_citation() {
        let req = ToolKind::VerifyCitation
            .request(&args(json!({"citation": "384 U.S. 436"})))
            .unwrap()
            .unwrap();
        assert_eq!(
            req,
            ApiRequest::Post {
                path: "/verify",
                body: json!({"citation": "384 U.S. 436"}),
            }
        );
    }

    #[test]
    fn search_sends_q_and_optional_limit() {
        let without = ToolKind::SearchCases
            .request(&args(json!({"query": "qualified immunity"})))
            .unwrap()
            .unwrap();
        assert_eq!(
            without,
            ApiRequest::Get {
                path: "/search",
                query: vec![("q".to_string(), "qualified immunity".to_string())],
            }
        );

        let with = ToolKind::SearchCases
            .request(&args(json!({"query": "qualified immunity", "limit": 3})))
            .unwrap()
            .unwrap();
        assert_eq!(
            with,
            ApiRequest::Get {
                path: "/search",
                query: vec![
                    ("q".to_string(), "qualified immunity".to_string()),
                    ("limit".to_string(), "3".to_string()),
                ],
            }
        );
    }

    #[test]
    fn hallucination_check_path() {
        let req = ToolKind::CheckHallucinations
            .request(&args(json!({"text": "See Roe v. Wade."})))
            .unwrap()
            .unwrap();
        assert_eq!(req.path(), "/hallucination-check");
    }

    #[test]
    fn setup_has_no_request() {
        let req = ToolKind::SetupApiKey.request(&args(json!({"api_key": "k"}))).unwrap();
        assert!(req.is_none());
    }

    #[test]
    fn missing_and_mistyped_arguments() {
        assert_eq!(
            ToolKind::VerifyCitation.request(&Map::new()).unwrap_err(),
            ArgumentError::Missing("citation")
        );
        assert!(matches!(
            ToolKind::CheckHallucinations.request(&args(json!({"text": 42}))),
            Err(ArgumentError::WrongType { field: "text", .. })
        ));
        assert!(matches!(
            ToolKind::SearchCases.request(&args(json!({"query": "x", "limit": "ten"}))),
            Err(ArgumentError::WrongType { field: "limit", .. })
        ));
    }

    #[test]
    fn bulk_citation_bounds() {
        let too_many: Vec<String> = (0..=MAX_BULK_CITATIONS).map(|i| format!("{i} U.S. 1")).collect();
        assert_eq!(
            ToolKind::VerifyBulkCitations
                .request(&args(json!({"citations": too_many})))
                .unwrap_err(),
            ArgumentError::CitationCount(51)
        );
        assert_eq!(
            ToolKind::VerifyBulkCitations
                .request(&args(json!({"citations": []})))
                .unwrap_err(),
            ArgumentError::CitationCount(0)
        );

        let max: Vec<String> = (0..MAX_BULK_CITATIONS).map(|i| format!("{i} U.S. 1")).collect();
        assert!(ToolKind::VerifyBulkCitations
            .request(&args(json!({"citations": max})))
            .is_ok());
    }
}

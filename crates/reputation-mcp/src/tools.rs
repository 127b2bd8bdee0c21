use std::sync::Arc;

use chrono::{DateTime, Utc};
use reputation_core::*;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{McpError, Result};
use crate::rate_limit::{MokaRateLimitStore, RateLimitStore, RateLimiter};

// ============================================================================
// MCP Protocol Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

pub const PARSE_ERROR: i32 = -32700;
pub const METHOD_NOT_FOUND: i32 = -32601;

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Value, code: i32, message: String) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError { code, message }),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Tool {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

// ============================================================================
// Tool Definitions
// ============================================================================

fn signals_schema() -> Value {
    json!({
        "type": "object",
        "description": "Wallet signals; omitted fields count as zero",
        "properties": {
            "is_verified": { "type": "boolean" },
            "badge_types": {
                "type": "array",
                "items": {
                    "type": "string",
                    "description": "Badge identifier such as VERIFIED_IDENTITY or ELITE_SCORE; unrecognized identifiers score as unknown badges"
                }
            },
            "account_age_days": { "type": "integer" },
            "transaction_count": { "type": "integer" },
            "endorsement_weight": { "type": "string", "description": "Decayed weight in whole tokens" },
            "endorsement_count": { "type": "integer" },
            "unique_counterparties": { "type": "integer" },
            "on_chain_age_days": { "type": "integer" },
            "identity_signals": {
                "type": "object",
                "properties": {
                    "kyc_level": { "type": "integer", "minimum": 0, "maximum": 3 },
                    "has_verified_email": { "type": "boolean" },
                    "has_verified_phone": { "type": "boolean" },
                    "profile_complete": { "type": "boolean" },
                    "account_age_days": { "type": "integer" }
                }
            }
        }
    })
}

pub fn get_tools() -> Vec<Tool> {
    vec![
        Tool {
            name: "calculate_score".to_string(),
            description: "Compute a wallet's composite reputation score (0-1000), the five category sub-scores and its tier from raw signals.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "signals": signals_schema(),
                    "trend": {
                        "type": "integer",
                        "description": "Change since the previous snapshot, passed through (default: 0)"
                    }
                },
                "required": ["signals"]
            }),
        },
        Tool {
            name: "get_tier".to_string(),
            description: "Classify a composite score into elite, excellent, good, building or at_risk, with the points needed for the next tier.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "score": { "type": "integer", "minimum": 0, "maximum": 1000 }
                },
                "required": ["score"]
            }),
        },
        Tool {
            name: "decay_endorsements".to_string(),
            description: "Apply time decay to endorsement stakes (6 month grace, then 10% per month) and total the active weight.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "endorsements": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "stake_amount": { "type": "string", "description": "Stake in the token's smallest unit" },
                                "created_at": { "type": "string", "format": "date-time" },
                                "active": { "type": "boolean" }
                            },
                            "required": ["stake_amount", "created_at", "active"]
                        }
                    },
                    "now": {
                        "type": "string",
                        "format": "date-time",
                        "description": "Evaluation time (default: current time)"
                    }
                },
                "required": ["endorsements"]
            }),
        },
        Tool {
            name: "commit_score".to_string(),
            description: "Compute the 32-byte commitment binding a wallet to a score, for publishing instead of the raw score.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "address": { "type": "string", "description": "0x-prefixed 20-byte wallet address" },
                    "score": { "type": "integer", "minimum": 0, "maximum": 1000 }
                },
                "required": ["address", "score"]
            }),
        },
        Tool {
            name: "verify_score".to_string(),
            description: "Check a claimed score against the score live signals produce, within the configured tolerance. Returns only a boolean.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "address": { "type": "string" },
                    "claimed_score": { "type": "integer", "minimum": 0 },
                    "signals": signals_schema()
                },
                "required": ["address", "claimed_score", "signals"]
            }),
        },
        Tool {
            name: "verify_commitment".to_string(),
            description: "Check that a published commitment was produced from the given wallet and score.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "address": { "type": "string" },
                    "score": { "type": "integer", "minimum": 0, "maximum": 1000 },
                    "commitment": { "type": "string", "description": "0x-prefixed 32-byte hash" }
                },
                "required": ["address", "score", "commitment"]
            }),
        },
        Tool {
            name: "evaluate_badges".to_string(),
            description: "Evaluate every badge predicate for a wallet, with reasons and progress toward numeric thresholds.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "context": {
                        "type": "object",
                        "properties": {
                            "identity_linked": { "type": "boolean" },
                            "endorsements_given": { "type": "integer" },
                            "active_endorsements_given": { "type": "integer" },
                            "active_endorsements_received": { "type": "integer" },
                            "registered_at": { "type": "string", "format": "date-time" },
                            "overall_score": { "type": "integer" }
                        }
                    },
                    "now": { "type": "string", "format": "date-time" }
                },
                "required": ["context"]
            }),
        },
        Tool {
            name: "evaluate_airdrop".to_string(),
            description: "Evaluate airdrop criteria (score, badges, endorsement weight, registration) against a wallet and list every unmet requirement.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "criteria": {
                        "type": "object",
                        "properties": {
                            "min_score": { "type": "integer" },
                            "required_badges": { "type": "array", "items": { "type": "string" } },
                            "badge_requirement": { "type": "string", "enum": ["any", "all"] },
                            "min_endorsement_weight": { "type": "string" },
                            "requires_registration": { "type": "boolean" }
                        }
                    },
                    "attributes": {
                        "type": "object",
                        "properties": {
                            "is_registered": { "type": "boolean" },
                            "score": { "type": "integer" },
                            "owned_badges": { "type": "array", "items": { "type": "string" } },
                            "endorsement_weight": { "type": "string" }
                        }
                    }
                },
                "required": ["criteria", "attributes"]
            }),
        },
    ]
}

// ============================================================================
// Tool Parameters & Responses
// ============================================================================

#[derive(Debug, Deserialize)]
struct CalculateScoreParams {
    signals: UserSignals,
    #[serde(default)]
    trend: i32,
}

#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    #[serde(flatten)]
    pub breakdown: ScoreBreakdown,
    pub tier_label: String,
    pub points_to_next_tier: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct TierParams {
    score: u16,
}

#[derive(Debug, Serialize)]
pub struct TierResponse {
    pub score: u16,
    pub tier: Tier,
    pub label: String,
    pub min_score: u16,
    pub points_to_next_tier: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct DecayParams {
    endorsements: Vec<EndorsementRecord>,
    #[serde(default)]
    now: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct DecayedEndorsement {
    pub stake_amount: Decimal,
    pub current_weight: Decimal,
    pub active: bool,
}

#[derive(Debug, Serialize)]
pub struct DecayResponse {
    pub evaluated_at: DateTime<Utc>,
    pub endorsements: Vec<DecayedEndorsement>,
    /// Active weight in the token's smallest unit
    pub total_weight: Decimal,
    /// Active weight in whole tokens
    pub total_weight_tokens: Decimal,
}

#[derive(Debug, Deserialize)]
struct CommitParams {
    address: WalletAddress,
    score: u16,
}

#[derive(Debug, Serialize)]
pub struct CommitResponse {
    pub address: WalletAddress,
    pub commitment: ScoreCommitment,
    pub salt_version: String,
    /// Commit requests left for this wallet in the current window
    pub remaining_requests: u32,
}

#[derive(Debug, Deserialize)]
struct VerifyScoreParams {
    address: WalletAddress,
    claimed_score: u32,
    signals: UserSignals,
}

#[derive(Debug, Deserialize)]
struct VerifyCommitmentParams {
    address: WalletAddress,
    score: u16,
    commitment: ScoreCommitment,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub address: WalletAddress,
    pub valid: bool,
}

#[derive(Debug, Deserialize)]
struct BadgeParams {
    context: BadgeContext,
    #[serde(default)]
    now: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct AirdropParams {
    criteria: EligibilityCriteria,
    attributes: UserAttributes,
}

fn parse<T: DeserializeOwned>(args: &Value) -> Result<T> {
    serde_json::from_value(args.clone()).map_err(|e| McpError::InvalidParams(e.to_string()))
}

fn ensure_score_in_range(score: u16) -> Result<()> {
    if score > MAX_SCORE {
        return Err(McpError::InvalidParams(format!(
            "score must be between {} and {}, got {}",
            MIN_SCORE, MAX_SCORE, score
        )));
    }
    Ok(())
}

// ============================================================================
// Tool Business Logic
// ============================================================================

/// Core reputation tool logic
pub struct ReputationTools<S: RateLimitStore = MokaRateLimitStore> {
    codec: CommitmentCodec,
    badges: BadgeEvaluator,
    limiter: Arc<RateLimiter<S>>,
}

impl<S: RateLimitStore> ReputationTools<S> {
    pub fn new(codec: CommitmentCodec, badges: BadgeEvaluator, limiter: Arc<RateLimiter<S>>) -> Self {
        Self {
            codec,
            badges,
            limiter,
        }
    }

    /// Execute a tool by name
    pub fn execute(&self, name: &str, args: &Value) -> std::result::Result<Value, String> {
        let result = match name {
            "calculate_score" => parse(args)
                .and_then(|p| self.calculate_score(p))
                .and_then(to_value),
            "get_tier" => parse(args).and_then(|p| self.get_tier(p)).and_then(to_value),
            "decay_endorsements" => parse(args)
                .map(|p| self.decay_endorsements(p))
                .and_then(to_value),
            "commit_score" => parse(args)
                .and_then(|p| self.commit_score(p))
                .and_then(to_value),
            "verify_score" => parse(args)
                .and_then(|p| self.verify_score(p))
                .and_then(to_value),
            "verify_commitment" => parse(args)
                .and_then(|p| self.verify_commitment(p))
                .and_then(to_value),
            "evaluate_badges" => parse(args)
                .map(|p| self.evaluate_badges(p))
                .and_then(to_value),
            "evaluate_airdrop" => parse(args)
                .map(|p| self.evaluate_airdrop(p))
                .and_then(to_value),
            _ => return Err(format!("Unknown tool: {}", name)),
        };

        result.map_err(|e| e.to_string())
    }

    fn calculate_score(&self, params: CalculateScoreParams) -> Result<ScoreResponse> {
        params.signals.validate()?;

        let breakdown = calculate_breakdown(&params.signals, params.trend);
        Ok(ScoreResponse {
            tier_label: breakdown.tier.label().to_string(),
            points_to_next_tier: points_to_next_tier(breakdown.overall),
            breakdown,
        })
    }

    fn get_tier(&self, params: TierParams) -> Result<TierResponse> {
        ensure_score_in_range(params.score)?;

        let tier = tier_from_score(params.score);
        Ok(TierResponse {
            score: params.score,
            tier,
            label: tier.label().to_string(),
            min_score: tier.min_score(),
            points_to_next_tier: points_to_next_tier(params.score),
        })
    }

    fn decay_endorsements(&self, params: DecayParams) -> DecayResponse {
        let now = params.now.unwrap_or_else(Utc::now);
        let total_weight = aggregate_endorsement_weight(&params.endorsements, now);

        DecayResponse {
            evaluated_at: now,
            endorsements: params
                .endorsements
                .iter()
                .map(|e| DecayedEndorsement {
                    stake_amount: e.stake_amount,
                    current_weight: e.current_weight(now),
                    active: e.active,
                })
                .collect(),
            total_weight,
            total_weight_tokens: to_whole_tokens(total_weight, TOKEN_DECIMALS),
        }
    }

    fn commit_score(&self, params: CommitParams) -> Result<CommitResponse> {
        ensure_score_in_range(params.score)?;
        self.limiter.check(&params.address.to_string())?;

        let commitment = self.codec.commit(&params.address, params.score);
        tracing::info!(wallet = %params.address, commitment = %commitment, "Issued score commitment");

        Ok(CommitResponse {
            remaining_requests: self.limiter.remaining(&params.address.to_string()),
            address: params.address,
            commitment,
            salt_version: self.codec.salt_version().to_string(),
        })
    }

    fn verify_score(&self, params: VerifyScoreParams) -> Result<VerifyResponse> {
        params.signals.validate()?;
        self.limiter.check(&params.address.to_string())?;

        Ok(VerifyResponse {
            valid: self
                .codec
                .verify(&params.address, params.claimed_score, &params.signals),
            address: params.address,
        })
    }

    fn verify_commitment(&self, params: VerifyCommitmentParams) -> Result<VerifyResponse> {
        ensure_score_in_range(params.score)?;

        Ok(VerifyResponse {
            valid: self
                .codec
                .verify_commitment(&params.address, params.score, &params.commitment),
            address: params.address,
        })
    }

    fn evaluate_badges(&self, params: BadgeParams) -> Vec<BadgeEligibility> {
        let now = params.now.unwrap_or_else(Utc::now);
        self.badges.evaluate_all(&params.context, now)
    }

    fn evaluate_airdrop(&self, params: AirdropParams) -> EligibilityResult {
        evaluate_airdrop(&params.criteria, &params.attributes)
    }
}

fn to_value<T: Serialize>(result: T) -> Result<Value> {
    Ok(serde_json::to_value(result)?)
}

// ============================================================================
// MCP Message Handlers
// ============================================================================

pub fn handle_initialize(_params: &Value) -> Value {
    json!({
        "protocolVersion": "2024-11-05",
        "capabilities": {
            "tools": {}
        },
        "serverInfo": {
            "name": "reputation-mcp",
            "version": env!("CARGO_PKG_VERSION")
        }
    })
}

pub fn handle_list_tools() -> Value {
    json!({
        "tools": get_tools()
    })
}

pub fn handle_call_tool<S: RateLimitStore>(tools: &ReputationTools<S>, params: &Value) -> Value {
    let name = params["name"].as_str().unwrap_or("");
    let args = &params["arguments"];

    match tools.execute(name, args) {
        Ok(result) => {
            json!({
                "content": [{
                    "type": "text",
                    "text": serde_json::to_string_pretty(&result).unwrap_or_default()
                }]
            })
        }
        Err(e) => {
            tracing::debug!(tool = %name, error = %e, "Tool call failed");
            json!({
                "content": [{
                    "type": "text",
                    "text": format!("Error: {}", e)
                }],
                "isError": true
            })
        }
    }
}

pub fn handle_request<S: RateLimitStore>(
    tools: &ReputationTools<S>,
    request: JsonRpcRequest,
) -> Option<JsonRpcResponse> {
    let result = match request.method.as_str() {
        "initialize" => Some(handle_initialize(&request.params)),
        "initialized" | "notifications/initialized" => None, // Notification, no response needed
        "tools/list" => Some(handle_list_tools()),
        "tools/call" => Some(handle_call_tool(tools, &request.params)),
        "notifications/cancelled" => None, // Notification
        _ => {
            return Some(JsonRpcResponse::failure(
                request.id,
                METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            ));
        }
    };

    result.map(|r| JsonRpcResponse::success(request.id, r))
}

/// Handle one raw line from the transport.
///
/// Blank lines are ignored. A line that is not a JSON-RPC request gets a
/// parse error with a null id, since the caller's id cannot be recovered.
pub fn handle_line<S: RateLimitStore>(tools: &ReputationTools<S>, line: &str) -> Option<JsonRpcResponse> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    match serde_json::from_str::<JsonRpcRequest>(line) {
        Ok(request) => {
            tracing::debug!(method = %request.method, "Received request");
            handle_request(tools, request)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Rejecting malformed request");
            Some(JsonRpcResponse::failure(
                Value::Null,
                PARSE_ERROR,
                format!("Parse error: {}", e),
            ))
        }
    }
}

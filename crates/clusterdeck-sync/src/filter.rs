//! Search-box filtering of replica groups.
//!
//! Queries are whitespace-separated tokens, matched case-insensitively.
//! `prefix:value` tokens constrain one property; the prefix may carry a
//! modifier (`status!:healthy` negates an exact match, `alias*:sub`
//! matches substrings). Recognized prefixes are `uuid`, `roles` (with
//! `role` as an alias), `alias`, `status`, `uri` and `labels`; anything
//! else is treated as free text. A token with an empty value is dropped.
//! Free tokens match against a per-group search string or as a uuid
//! prefix. All tokens AND together. Parsing and matching are pure: same
//! query and snapshot, same answer.

use clusterdeck_api::topology::{Instance, ReplicaGroup};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Uuid,
    Roles,
    Alias,
    Status,
    Uri,
    Labels,
}

impl Field {
    fn parse(prefix: &str) -> Option<Self> {
        match prefix {
            "uuid" => Some(Field::Uuid),
            "roles" | "role" => Some(Field::Roles),
            "alias" => Some(Field::Alias),
            "status" => Some(Field::Status),
            "uri" => Some(Field::Uri),
            "labels" => Some(Field::Labels),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Matcher {
    Exact,
    NegateExact,
    Substring,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Property {
        field: Field,
        matcher: Matcher,
        value: String,
    },
    Free(String),
}

/// A parsed filter query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterQuery {
    tokens: Vec<Token>,
}

impl FilterQuery {
    pub fn parse(raw: &str) -> Self {
        let tokens = raw
            .split_whitespace()
            .filter_map(|word| Self::parse_token(&word.to_lowercase()))
            .collect();
        Self { tokens }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    fn parse_token(word: &str) -> Option<Token> {
        let Some((prefix, value)) = word.split_once(':') else {
            return Some(Token::Free(word.to_string()));
        };

        let (bare, matcher) = match prefix.strip_suffix('!') {
            Some(bare) => (bare, Matcher::NegateExact),
            None => match prefix.strip_suffix('*') {
                Some(bare) => (bare, Matcher::Substring),
                None => (prefix, Matcher::Exact),
            },
        };

        match Field::parse(bare) {
            Some(field) => {
                if value.is_empty() {
                    // Half-typed token: constrain nothing.
                    None
                } else {
                    Some(Token::Property {
                        field,
                        matcher,
                        value: value.to_string(),
                    })
                }
            }
            None => Some(Token::Free(word.to_string())),
        }
    }
}

/// One group surviving the filter, with per-member match marks.
#[derive(Debug, Clone)]
pub struct GroupMatch<'a> {
    pub group: &'a ReplicaGroup,
    /// Parallel to `group.servers`.
    pub member_matches: Vec<bool>,
    pub matching_count: usize,
}

/// Applies the query. An empty query keeps every group with every member
/// marked.
pub fn filter_groups<'a>(groups: &'a [ReplicaGroup], query: &FilterQuery) -> Vec<GroupMatch<'a>> {
    groups
        .iter()
        .filter_map(|group| {
            if !group_matches(group, query) {
                return None;
            }
            let member_matches: Vec<bool> = group
                .servers
                .iter()
                .map(|member| member_matches_query(group, member, query))
                .collect();
            let matching_count = member_matches.iter().filter(|m| **m).count();
            Some(GroupMatch {
                group,
                member_matches,
                matching_count,
            })
        })
        .collect()
}

fn group_matches(group: &ReplicaGroup, query: &FilterQuery) -> bool {
    query.tokens.iter().all(|token| match token {
        Token::Property {
            field,
            matcher,
            value,
        } => match_values(&group_field_values(group, *field), *matcher, value),
        Token::Free(text) => {
            group_search_string(group).contains(text)
                || group.uuid.to_lowercase().starts_with(text)
                || group
                    .servers
                    .iter()
                    .any(|s| s.uuid.to_lowercase().starts_with(text))
        }
    })
}

fn member_matches_query(group: &ReplicaGroup, member: &Instance, query: &FilterQuery) -> bool {
    query.tokens.iter().all(|token| match token {
        Token::Property {
            field,
            matcher,
            value,
        } => match_values(&member_field_values(group, member, *field), *matcher, value),
        Token::Free(text) => {
            member_search_string(group, member).contains(text)
                || member.uuid.to_lowercase().starts_with(text)
        }
    })
}

fn match_values(values: &[String], matcher: Matcher, value: &str) -> bool {
    match matcher {
        Matcher::Exact => values.iter().any(|v| v == value),
        Matcher::NegateExact => !values.iter().any(|v| v == value),
        Matcher::Substring => values.iter().any(|v| v.contains(value)),
    }
}

fn group_field_values(group: &ReplicaGroup, field: Field) -> Vec<String> {
    let mut values = Vec::new();
    match field {
        Field::Uuid => {
            values.push(group.uuid.to_lowercase());
            values.extend(group.servers.iter().map(|s| s.uuid.to_lowercase()));
        }
        Field::Roles => values.extend(group.roles.iter().map(|r| r.to_lowercase())),
        Field::Alias => {
            values.push(group.alias.to_lowercase());
            values.extend(
                group
                    .servers
                    .iter()
                    .filter_map(|s| s.alias.as_ref().map(|a| a.to_lowercase())),
            );
        }
        Field::Status => values.extend(
            group
                .servers
                .iter()
                .map(|s| s.status.as_str().to_string()),
        ),
        Field::Uri => values.extend(group.servers.iter().map(|s| s.uri.to_lowercase())),
        Field::Labels => {
            for member in &group.servers {
                values.extend(
                    member
                        .labels
                        .iter()
                        .map(|l| format!("{}:{}", l.name, l.value).to_lowercase()),
                );
            }
        }
    }
    values
}

fn member_field_values(group: &ReplicaGroup, member: &Instance, field: Field) -> Vec<String> {
    match field {
        Field::Uuid => vec![member.uuid.to_lowercase()],
        Field::Roles => group.roles.iter().map(|r| r.to_lowercase()).collect(),
        Field::Alias => {
            let mut values = vec![group.alias.to_lowercase()];
            if let Some(alias) = member.alias.as_ref() {
                values.push(alias.to_lowercase());
            }
            values
        }
        Field::Status => vec![member.status.as_str().to_string()],
        Field::Uri => vec![member.uri.to_lowercase()],
        Field::Labels => member
            .labels
            .iter()
            .map(|l| format!("{}:{}", l.name, l.value).to_lowercase())
            .collect(),
    }
}

fn group_search_string(group: &ReplicaGroup) -> String {
    let mut out = String::new();
    out.push_str(&group.alias.to_lowercase());
    for role in &group.roles {
        out.push(' ');
        out.push_str(&role.to_lowercase());
    }
    for member in &group.servers {
        out.push(' ');
        out.push_str(&member_search_string(group, member));
    }
    out
}

fn member_search_string(group: &ReplicaGroup, member: &Instance) -> String {
    let mut out = String::new();
    out.push_str(&member.uri.to_lowercase());
    if let Some(alias) = member.alias.as_ref() {
        out.push(' ');
        out.push_str(&alias.to_lowercase());
    }
    out.push_str(" status:");
    out.push_str(member.status.as_str());
    if group.master.uuid == member.uuid {
        out.push_str(" is:leader");
    } else {
        out.push_str(" is:follower");
    }
    for label in &member.labels {
        out.push(' ');
        out.push_str(&format!("{}:{}", label.name, label.value).to_lowercase());
    }
    out
}

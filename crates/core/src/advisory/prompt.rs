use crate::grants::types::NormalizedGrant;
use crate::llm::ChatMessage;

const MISSING_FIELD: &str = "N/A";

pub fn system_prompt() -> String {
    [
        "You are an experienced grant strategy advisor.",
        "You help applicants decide which federal funding opportunities to pursue and how to prepare strong applications.",
        "Be concrete and concise. Refer to opportunities by their title.",
    ]
    .join("\n")
}

/// One line per grant: `1. Title (Agency)`, plus ` - closes <date>` when requested.
pub fn grant_list(grants: &[NormalizedGrant], include_close_date: bool) -> String {
    if grants.is_empty() {
        return "(no matching opportunities found)".to_string();
    }

    grants
        .iter()
        .enumerate()
        .map(|(idx, grant)| {
            let title = grant.title.as_deref().unwrap_or(MISSING_FIELD);
            let agency = grant.agency.as_deref().unwrap_or(MISSING_FIELD);
            let mut line = format!("{}. {title} ({agency})", idx + 1);
            if include_close_date {
                let close = grant
                    .close_date
                    .as_deref()
                    .filter(|d| !d.trim().is_empty())
                    .unwrap_or(MISSING_FIELD);
                line.push_str(&format!(" - closes {close}"));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn user_prompt(query: &str, grants: &[NormalizedGrant], include_close_date: bool) -> String {
    format!(
        "A user searched for grants with the query: \"{query}\".\n\n\
Matching opportunities:\n{}\n\n\
Suggest a short strategy for pursuing these opportunities: which look most promising for this query, \
what to prepare first, and any deadlines to watch.",
        grant_list(grants, include_close_date)
    )
}

pub fn conversation(
    query: &str,
    grants: &[NormalizedGrant],
    include_close_date: bool,
) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(system_prompt()),
        ChatMessage::user(user_prompt(query, grants, include_close_date)),
    ]
}

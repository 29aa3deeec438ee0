//! Route name derivation.

use super::model::HttpMethod;

/// `<Method><Segment>...` with every segment PascalCased and braces removed.
///
/// `GET /guilds/{guild_id}/bans/{user_id}` becomes `GetGuildsGuildIdBansUserId`.
pub fn route_name(method: HttpMethod, path: &str) -> String {
    let mut name = pascal_case(method.as_lower());
    for segment in path.split('/') {
        name.push_str(&pascal_case(segment));
    }
    name
}

/// Split on anything that is not ASCII alphanumeric and upper-case the first
/// letter of each word. The rest of each word is kept as written.
pub fn pascal_case(input: &str) -> String {
    input
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(capitalize_first)
        .collect()
}

fn capitalize_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
    }
}

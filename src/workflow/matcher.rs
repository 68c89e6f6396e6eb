use crate::types::User;

/// Queries shorter than this (after trimming) produce no suggestions.
pub const MIN_QUERY_CHARS: usize = 3;

/// Highest accepted score on the 0 (exact) to 1 (unrelated) scale.
pub const MAX_DISSIMILARITY: f64 = 0.4;

/// A user that matched an assignee query.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub user: &'a User,
    /// Normalized dissimilarity in `[0, 1]`; lower is better.
    pub score: f64,
}

struct Entry {
    user: User,
    name: Vec<char>,
}

/// Fuzzy search over the active users' full names.
///
/// Names are lower-cased once up front; each query is then scored against
/// every entry with an approximate-substring edit distance.
pub struct AssigneeMatcher {
    entries: Vec<Entry>,
}

impl AssigneeMatcher {
    /// Build a matcher over `users`, skipping any that are not active.
    pub fn new(users: Vec<User>) -> Self {
        let entries = users
            .into_iter()
            .filter(|u| u.status.is_active())
            .map(|user| {
                let name = user.full_name().to_lowercase().chars().collect();
                Entry { user, name }
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.entries.iter().map(|e| &e.user)
    }

    /// Rank users against `query`, best first. Equal scores keep the order
    /// the users were given in.
    pub fn search(&self, query: &str) -> Vec<Candidate<'_>> {
        let Some(query) = normalize_query(query) else {
            return Vec::new();
        };
        let mut hits: Vec<Candidate<'_>> = self
            .entries
            .iter()
            .filter_map(|e| {
                let score = substring_distance(&query, &e.name);
                (score <= MAX_DISSIMILARITY).then_some(Candidate {
                    user: &e.user,
                    score,
                })
            })
            .collect();
        // `sort_by` is stable, which gives the tie ordering.
        hits.sort_by(|a, b| a.score.total_cmp(&b.score));
        hits
    }
}

fn normalize_query(query: &str) -> Option<Vec<char>> {
    let q: Vec<char> = query.trim().to_lowercase().chars().collect();
    (q.len() >= MIN_QUERY_CHARS).then_some(q)
}

// Sellers' variant of Levenshtein: the match may start and end anywhere in
// `text`, so row 0 is all zeros and the answer is the minimum of the last row.
#[allow(clippy::cast_precision_loss)]
fn substring_distance(query: &[char], text: &[char]) -> f64 {
    if query.is_empty() {
        return 0.0;
    }
    let mut prev = vec![0usize; text.len() + 1];
    let mut cur = vec![0usize; text.len() + 1];
    for (i, qc) in query.iter().enumerate() {
        cur[0] = i + 1;
        for (j, tc) in text.iter().enumerate() {
            let substitute = prev[j] + usize::from(qc != tc);
            cur[j + 1] = substitute.min(prev[j + 1] + 1).min(cur[j] + 1);
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    let best = prev.iter().copied().min().unwrap_or(query.len());
    (best as f64 / query.len() as f64).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64, first: &str, last: &str) -> User {
        serde_json::from_value(serde_json::json!({
            "id": id, "email": format!("u{id}@example.com"),
            "firstName": first, "lastName": last, "status": "active"
        }))
        .unwrap()
    }

    fn names<'a>(hits: &[Candidate<'a>]) -> Vec<String> {
        hits.iter().map(|c| c.user.full_name()).collect()
    }

    #[test]
    fn short_queries_return_nothing() {
        let m = AssigneeMatcher::new(vec![user(1, "John", "Doe"), user(2, "Joanna", "Lee")]);
        assert!(m.search("Jo").is_empty());
        assert!(m.search("  jo  ").is_empty());
        assert!(m.search("").is_empty());
    }

    #[test]
    fn closer_name_ranks_first() {
        let m = AssigneeMatcher::new(vec![user(2, "Joanna", "Lee"), user(1, "John", "Doe")]);
        let hits = m.search("Joh");
        assert_eq!(names(&hits), ["John Doe", "Joanna Lee"]);
        assert!(hits[0].score < hits[1].score);
    }

    #[test]
    fn every_hit_is_within_threshold() {
        let users = vec![
            user(1, "John", "Doe"),
            user(2, "Joanna", "Lee"),
            user(3, "Mary", "Smith"),
            user(4, "Jonathan", "Price"),
        ];
        let m = AssigneeMatcher::new(users);
        for q in ["joh", "smi", "price", "xyzzy", "lee"] {
            let hits = m.search(q);
            assert!(hits.iter().all(|c| c.score <= MAX_DISSIMILARITY), "{q}");
            assert!(hits.windows(2).all(|w| w[0].score <= w[1].score), "{q}");
        }
    }

    #[test]
    fn ties_keep_input_order() {
        let m = AssigneeMatcher::new(vec![
            user(1, "Ann", "Smith"),
            user(2, "Bob", "Smith"),
            user(3, "Cat", "Smith"),
        ]);
        let ids: Vec<i64> = m.search("smith").iter().map(|c| c.user.id).collect();
        assert_eq!(ids, [1, 2, 3]);
    }

    #[test]
    fn disabled_users_are_not_candidates() {
        let mut gone = user(5, "John", "Gone");
        gone.status = crate::types::EnableState::Disabled;
        let m = AssigneeMatcher::new(vec![gone, user(1, "John", "Doe")]);
        assert_eq!(m.len(), 1);
        assert_eq!(names(&m.search("john")), ["John Doe"]);
    }

    fn dissimilarity(query: &str, name: &str) -> f64 {
        let q: Vec<char> = query.to_lowercase().chars().collect();
        let n: Vec<char> = name.to_lowercase().chars().collect();
        substring_distance(&q, &n)
    }

    #[test]
    fn dissimilarity_bounds() {
        assert_eq!(dissimilarity("doe", "John Doe"), 0.0);
        assert_eq!(dissimilarity("JOHN", "john doe"), 0.0);
        assert!((dissimilarity("joh", "Joanna Lee") - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(dissimilarity("qqq", "ab"), 1.0);
    }
}

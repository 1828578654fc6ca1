use crate::domain::User;

/// Case-insensitive substring match over name, email and city.
///
/// A blank term matches everything.
pub fn filter_users<'a>(users: &'a [User], term: &str) -> Vec<&'a User> {
    if term.trim().is_empty() {
        return users.iter().collect();
    }
    let term = term.to_lowercase();
    users.iter().filter(|user| matches(user, &term)).collect()
}

fn matches(user: &User, term: &str) -> bool {
    user.name.to_lowercase().contains(term)
        || user.email.to_lowercase().contains(term)
        || user
            .address
            .city
            .as_deref()
            .is_some_and(|city| city.to_lowercase().contains(term))
}

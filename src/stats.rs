use std::collections::HashMap;
use std::fmt;

use crate::domain::User;

pub const TOP_CITIES_MAX: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct UserStats {
    pub total: usize,
    pub with_city: usize,
    /// Rounded; 0 for an empty collection.
    pub with_city_percent: u32,
    /// Most common cities, most frequent first, ties in order of appearance.
    pub top_cities: Vec<(String, usize)>,
}

impl UserStats {
    pub fn compute(users: &[User]) -> Self {
        let mut counts: Vec<(String, usize)> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();
        for city in users.iter().filter_map(User::informed_city) {
            match index.get(city) {
                Some(&slot) => counts[slot].1 += 1,
                None => {
                    index.insert(city, counts.len());
                    counts.push((city.to_string(), 1));
                }
            }
        }

        let total = users.len();
        let with_city = counts.iter().map(|(_, count)| count).sum();
        let with_city_percent = if total == 0 {
            0
        } else {
            ((with_city as f64 / total as f64) * 100.0).round() as u32
        };

        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts.truncate(TOP_CITIES_MAX);

        Self {
            total,
            with_city,
            with_city_percent,
            top_cities: counts,
        }
    }
}

impl fmt::Display for UserStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total users: {}", self.total)?;
        writeln!(
            f,
            "With city:   {} ({}% of users)",
            self.with_city, self.with_city_percent
        )?;
        if self.top_cities.is_empty() {
            return writeln!(f, "No city informed by any user");
        }
        writeln!(f, "Most common cities:")?;
        for (city, count) in &self.top_cities {
            let plural = if *count > 1 { "s" } else { "" };
            writeln!(f, "  {:<24} {} user{}", city, count, plural)?;
        }
        Ok(())
    }
}

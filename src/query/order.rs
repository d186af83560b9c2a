use log::debug;

use super::columns::{ColSet, ColSpec, USERS_KEY_COL};
use super::state::{Direction, SortState};

#[derive(Debug, PartialEq, Eq)]
struct OrderSpec {
    column: &'static str,
    direction: Direction,
    collation: Option<&'static str>,
}

/// ORDER BY for a listing: at most one requested column, then the unique key
/// so that ties (and the unsorted case) always come back in the same order.
#[derive(Debug, PartialEq, Eq)]
pub struct Order {
    order_specs: Vec<OrderSpec>,
}

impl Order {
    /// Resolves the sort state against `col_set`. An absent or unknown column
    /// falls back to the default order rather than failing.
    pub fn from_sort_state(sort: &SortState, col_set: ColSet) -> Self {
        let requested = sort.column.as_deref().and_then(|column| {
            let col_spec = col_set.get(column);
            if col_spec.is_none() {
                debug!("Ignoring unknown sort column '{}'", column);
            }
            col_spec
        });

        match requested {
            Some(col_spec) => Order {
                order_specs: vec![
                    Self::spec(col_spec, sort.direction),
                    Self::spec(&USERS_KEY_COL, sort.direction),
                ],
            },
            None => Self::default_order(),
        }
    }

    pub fn default_order() -> Self {
        Order {
            order_specs: vec![Self::spec(&USERS_KEY_COL, Direction::Asc)],
        }
    }

    fn spec(col_spec: &'static ColSpec, direction: Direction) -> OrderSpec {
        OrderSpec {
            column: col_spec.name_db,
            direction,
            collation: col_spec.collation(),
        }
    }

    pub fn to_order_clause(&self) -> String {
        let mut order_clause = "\nORDER BY ".to_string();
        let mut first = true;

        for order in &self.order_specs {
            match first {
                true => first = false,
                false => order_clause.push_str(", "),
            }

            order_clause.push_str(order.column);

            if let Some(collation) = order.collation {
                order_clause.push_str(" COLLATE ");
                order_clause.push_str(collation);
            }

            order_clause.push(' ');
            order_clause.push_str(order.direction.as_sql());
        }
        order_clause
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn clause(sort: SortState) -> String {
        Order::from_sort_state(&sort, ColSet::users()).to_order_clause()
    }

    #[test]
    fn test_default_order() {
        assert_eq!(clause(SortState::default()), "\nORDER BY users.id ASC");
        assert_eq!(
            Order::from_sort_state(&SortState::default(), ColSet::users()),
            Order::default_order()
        );
    }

    #[test]
    fn test_known_column_with_tiebreaker() {
        assert_eq!(
            clause(SortState::new("first_name", Direction::Asc)),
            "\nORDER BY users.first_name COLLATE NOCASE ASC, users.id ASC"
        );
        assert_eq!(
            clause(SortState::new("created_at", Direction::Desc)),
            "\nORDER BY users.created_at DESC, users.id DESC"
        );
    }

    #[test]
    fn test_unknown_column_falls_back() {
        assert_eq!(
            clause(SortState::new("password", Direction::Desc)),
            "\nORDER BY users.id ASC"
        );
        assert_eq!(
            clause(SortState::new("id; DROP TABLE users", Direction::Asc)),
            "\nORDER BY users.id ASC"
        );
    }
}

use crate::domain::entities::query::{FieldName, SortKey, SortSpec};

/// How a column-header click changes the ordering. Chosen once per screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortPolicy {
    /// One active column; clicking another column replaces it.
    #[default]
    SingleColumn,
    /// Clicking prepends a column; clicking a secondary column removes it.
    MultiColumn,
}

pub fn replace_sort<F: FieldName>(new_spec: SortSpec<F>) -> SortSpec<F> {
    non_empty(new_spec)
}

pub fn toggle_field<F: FieldName>(current: &SortSpec<F>, field: F, policy: SortPolicy) -> SortSpec<F> {
    let primary = current.primary();

    match policy {
        SortPolicy::SingleColumn => match primary {
            Some(key) if key.field == field => SortSpec::single(SortKey {
                field,
                direction: key.direction.flipped(),
            }),
            _ => SortSpec::single(SortKey::asc(field)),
        },
        SortPolicy::MultiColumn => {
            let mut keys = current.keys.clone();
            match keys.iter().position(|key| key.field == field) {
                Some(0) => keys[0].direction = keys[0].direction.flipped(),
                Some(idx) => {
                    keys.remove(idx);
                }
                None => keys.insert(0, SortKey::asc(field)),
            }
            non_empty(SortSpec::new(keys))
        }
    }
}

fn non_empty<F: FieldName>(spec: SortSpec<F>) -> SortSpec<F> {
    if spec.is_empty() {
        F::default_sort()
    } else {
        spec
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::query::SortDirection;
    use crate::domain::entities::shipment::ShipmentField;

    #[test]
    fn toggling_twice_restores_direction() {
        for policy in [SortPolicy::SingleColumn, SortPolicy::MultiColumn] {
            let start = SortSpec::single(SortKey::desc(ShipmentField::Cost));
            let once = toggle_field(&start, ShipmentField::Cost, policy);
            let twice = toggle_field(&once, ShipmentField::Cost, policy);

            assert_eq!(once.primary().map(|k| k.direction), Some(SortDirection::Ascending));
            assert_eq!(twice, start);
        }
    }

    #[test]
    fn single_column_replaces_other_field() {
        let start = ShipmentField::default_sort();

        let next = toggle_field(&start, ShipmentField::Origin, SortPolicy::SingleColumn);

        assert_eq!(next, SortSpec::single(SortKey::asc(ShipmentField::Origin)));
    }

    #[test]
    fn multi_column_prepends_then_removes_secondary() {
        let start = SortSpec::single(SortKey::desc(ShipmentField::CreatedAt));

        let added = toggle_field(&start, ShipmentField::Status, SortPolicy::MultiColumn);
        assert_eq!(
            added.keys,
            vec![
                SortKey::asc(ShipmentField::Status),
                SortKey::desc(ShipmentField::CreatedAt),
            ]
        );

        let removed = toggle_field(&added, ShipmentField::CreatedAt, SortPolicy::MultiColumn);
        assert_eq!(removed.keys, vec![SortKey::asc(ShipmentField::Status)]);
    }

    #[test]
    fn empty_spec_falls_back_to_default() {
        assert_eq!(
            replace_sort(SortSpec::<ShipmentField>::new(Vec::new())),
            ShipmentField::default_sort()
        );

        let toggled = toggle_field(
            &SortSpec::new(Vec::new()),
            ShipmentField::Origin,
            SortPolicy::MultiColumn,
        );
        assert_eq!(toggled.keys, vec![SortKey::asc(ShipmentField::Origin)]);
    }

    #[test]
    fn duplicate_keys_are_tolerated() {
        let start = SortSpec::new(vec![
            SortKey::asc(ShipmentField::Origin),
            SortKey::desc(ShipmentField::Origin),
        ]);

        let next = toggle_field(&start, ShipmentField::Origin, SortPolicy::MultiColumn);

        assert_eq!(next.keys[0], SortKey::desc(ShipmentField::Origin));
        assert_eq!(next.keys.len(), 2);
    }
}

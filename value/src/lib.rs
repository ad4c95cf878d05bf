pub use value::Value;
pub use record::RecordFields;
pub use factory::RecordFactory;
pub use sample::{Blank, BlankFactory, Event, EventFactory, Person, PersonFactory};

mod factory;
mod record;
pub mod sample;
mod value;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn person_round_trips_through_fields() {
        let person = Person {
            id: 42,
            name: "ada".to_string(),
        };
        let fields = person.fields();
        let rebuilt = Person::from_fields(
            fields
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        )
        .unwrap();
        assert_eq!(rebuilt.id, person.id);
        assert_eq!(rebuilt.name, person.name);
    }
}

use std::collections::{btree_map, BTreeMap, BTreeSet};

use crate::circuit::{Circuit, Witness};
use crate::error::SolverError;
use crate::field::FieldElement;

/// Sparse assignment of witness indices to field values.
///
/// `set` is the only mutator. Iteration is ordered by witness index, which
/// keeps serialized output stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WitnessMap(BTreeMap<Witness, FieldElement>);

impl WitnessMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, witness: Witness) -> Option<FieldElement> {
        self.0.get(&witness).copied()
    }

    pub fn contains(&self, witness: Witness) -> bool {
        self.0.contains_key(&witness)
    }

    /// Assigns `value` to `witness`. Re-assigning an equal value is a no-op.
    pub fn set(&mut self, witness: Witness, value: FieldElement) -> Result<(), SolverError> {
        match self.0.entry(witness) {
            btree_map::Entry::Vacant(entry) => {
                entry.insert(value);
                Ok(())
            }
            btree_map::Entry::Occupied(entry) if *entry.get() == value => Ok(()),
            btree_map::Entry::Occupied(entry) => Err(SolverError::ConflictingAssignment {
                witness,
                existing: *entry.get(),
                attempted: value,
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Witness, FieldElement)> + '_ {
        self.0.iter().map(|(w, v)| (*w, *v))
    }

    /// Witnesses referenced by `circuit` that have no value yet.
    pub fn missing(&self, circuit: &Circuit) -> BTreeSet<Witness> {
        circuit
            .referenced_witnesses()
            .into_iter()
            .filter(|w| !self.contains(*w))
            .collect()
    }

    pub fn is_complete(&self, circuit: &Circuit) -> bool {
        self.missing(circuit).is_empty()
    }

    /// Builds a map from the index to hex-string form used at the API boundary.
    pub fn from_hex_map(entries: &BTreeMap<u32, String>) -> Result<Self, SolverError> {
        let mut map = WitnessMap::new();
        for (index, text) in entries {
            let value = FieldElement::from_hex(text).map_err(|e| {
                SolverError::MalformedInput(format!("witness {index}: {e}"))
            })?;
            map.set(Witness(*index), value)?;
        }
        Ok(map)
    }

    pub fn to_hex_map(&self) -> BTreeMap<u32, String> {
        self.0
            .iter()
            .map(|(w, v)| (w.index(), v.to_string()))
            .collect()
    }
}

impl From<BTreeMap<Witness, FieldElement>> for WitnessMap {
    fn from(map: BTreeMap<Witness, FieldElement>) -> Self {
        WitnessMap(map)
    }
}

impl From<WitnessMap> for BTreeMap<Witness, FieldElement> {
    fn from(map: WitnessMap) -> Self {
        map.0
    }
}

impl FromIterator<(Witness, FieldElement)> for WitnessMap {
    fn from_iter<I: IntoIterator<Item = (Witness, FieldElement)>>(iter: I) -> Self {
        WitnessMap(iter.into_iter().collect())
    }
}

impl IntoIterator for WitnessMap {
    type Item = (Witness, FieldElement);
    type IntoIter = btree_map::IntoIter<Witness, FieldElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

// JSON form: {"1": "0x…", "2": "0x…"}
impl serde::Serialize for WitnessMap {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serde::Serialize::serialize(&self.to_hex_map(), serializer)
    }
}

impl<'de> serde::Deserialize<'de> for WitnessMap {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries: BTreeMap<u32, String> = serde::Deserialize::deserialize(deserializer)?;
        WitnessMap::from_hex_map(&entries).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{Expression, Opcode};

    fn fe(x: i64) -> FieldElement {
        FieldElement::from_i64(x)
    }

    #[test]
    fn test_set_is_idempotent() {
        let mut map = WitnessMap::new();
        map.set(Witness(3), fe(5)).unwrap();
        map.set(Witness(3), fe(5)).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(Witness(3)), Some(fe(5)));
        assert_eq!(map.get(Witness(4)), None);
    }

    #[test]
    fn test_set_conflict() {
        let mut map = WitnessMap::new();
        map.set(Witness(3), fe(5)).unwrap();
        assert_eq!(
            map.set(Witness(3), fe(6)),
            Err(SolverError::ConflictingAssignment {
                witness: Witness(3),
                existing: fe(5),
                attempted: fe(6),
            })
        );
        assert_eq!(map.get(Witness(3)), Some(fe(5)));
    }

    #[test]
    fn test_completeness() {
        let circuit = Circuit {
            opcodes: vec![Opcode::Arithmetic(Expression::linear(
                vec![(fe(1), Witness(1)), (fe(-1), Witness(2))],
                fe(0),
            ))],
            return_values: [Witness(3)].into(),
            ..Default::default()
        };
        let mut map: WitnessMap = [(Witness(1), fe(7)), (Witness(2), fe(7))].into_iter().collect();
        assert!(!map.is_complete(&circuit));
        assert_eq!(map.missing(&circuit), BTreeSet::from([Witness(3)]));
        map.set(Witness(3), fe(0)).unwrap();
        assert!(map.is_complete(&circuit));
    }

    #[test]
    fn test_hex_map() {
        let mut entries = BTreeMap::new();
        entries.insert(2, format!("0x{}", fe(10).to_hex()));
        entries.insert(1, fe(-1).to_hex());
        let map = WitnessMap::from_hex_map(&entries).unwrap();
        assert_eq!(map.get(Witness(1)), Some(fe(-1)));

        let back = map.to_hex_map();
        assert_eq!(back[&2], entries[&2]);
        assert!(back[&1].starts_with("0x"));
        assert_eq!(back[&1].len(), 66);

        entries.insert(3, "0x0a".to_string());
        assert!(matches!(
            WitnessMap::from_hex_map(&entries),
            Err(SolverError::MalformedInput(message)) if message.starts_with("witness 3")
        ));
    }

    #[test]
    fn test_json_form() {
        let map: WitnessMap = [(Witness(9), fe(1))].into_iter().collect();
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(
            json,
            format!("{{\"9\":\"0x{}\"}}", fe(1).to_hex())
        );
        let back: WitnessMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
        assert!(serde_json::from_str::<WitnessMap>("{\"1\":\"0x1\"}").is_err());
    }
}

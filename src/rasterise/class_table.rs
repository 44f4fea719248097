use std::collections::BTreeMap;

/// Maps vector class codes to the byte written into the raster
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassTable {
    values: BTreeMap<i32, u8>,
}

impl ClassTable {
    pub fn new(pairs: &[(i32, u8)]) -> ClassTable {
        ClassTable {
            values: pairs.iter().copied().collect(),
        }
    }

    pub fn get(&self, class_code: i32) -> Option<u8> {
        self.values.get(&class_code).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Codes of both tables, `other` wins on conflicts
    pub fn union(&self, other: &ClassTable) -> ClassTable {
        let mut values = self.values.clone();
        values.extend(other.values.iter().map(|(k, v)| (*k, *v)));
        ClassTable { values }
    }

    /// Codes of `self` that are not in `other`
    pub fn without(&self, other: &ClassTable) -> ClassTable {
        ClassTable {
            values: self
                .values
                .iter()
                .filter(|(k, _)| !other.values.contains_key(k))
                .map(|(k, v)| (*k, *v))
                .collect(),
        }
    }
}

/// Class codes of the national topographic database
pub mod topographic {
    use super::ClassTable;

    pub fn water_lines() -> ClassTable {
        ClassTable::new(&[
            (36311, 50), // stream, under 2 m
            (36312, 51), // stream, 2-5 m
        ])
    }

    pub fn road_lines() -> ClassTable {
        ClassTable::new(&[
            (12111, 70), // highway Ia
            (12112, 72), // highway Ib
            (12121, 74), // highway IIa
            (12122, 76), // highway IIb
            (12131, 78), // highway IIIa
            (12132, 80), // highway IIIb
            (12141, 82), // driveway
            (12313, 88), // path
            (12314, 86), // pedestrian and bicycle way
            (12316, 84), // track
        ])
    }

    pub fn building_polygons() -> ClassTable {
        ClassTable::new(&[
            (42210, 100), // residential
            (42211, 101),
            (42212, 102),
            (42220, 103), // commercial or public
            (42221, 104),
            (42222, 105),
            (42230, 106), // holiday
            (42231, 107),
            (42232, 108),
            (42240, 109), // industrial
            (42241, 110),
            (42242, 111),
            (42270, 112), // church
            (42250, 113), // religious
            (42251, 114),
            (42252, 115),
            (42260, 116), // other
            (42261, 117),
            (42262, 118),
        ])
    }

    pub fn water_polygons() -> ClassTable {
        ClassTable::new(&[
            (36200, 130), // lake
            (36211, 131), // sea
        ])
    }

    pub fn swamp_polygons() -> ClassTable {
        ClassTable::new(&[
            (35411, 135), // easy, open
            (35412, 136), // easy, forested
            (35421, 137), // difficult, open
            (35422, 138), // difficult, forested
        ])
    }

    pub fn field_polygons() -> ClassTable {
        ClassTable::new(&[(32611, 140), (32612, 141), (32800, 142)])
    }

    pub fn rock_polygons() -> ClassTable {
        ClassTable::new(&[(34700, 145), (34100, 146), (32500, 147), (32111, 148)])
    }

    pub fn rock_lines() -> ClassTable {
        ClassTable::new(&[(34400, 150), (34500, 151), (34800, 152)])
    }

    pub fn sand_polygons() -> ClassTable {
        ClassTable::new(&[(34300, 160), (32112, 161)])
    }
}

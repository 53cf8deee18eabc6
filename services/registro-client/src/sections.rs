//! Electoral sections of the Province of Buenos Aires
//!
//! Fixed reference data: eight sections, each an ordered list of
//! municipalities. Never mutated or persisted by the client.

use serde::Serialize;

/// An electoral section and the municipalities it groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Section {
    pub number: u8,
    pub name: &'static str,
    pub municipalities: &'static [&'static str],
}

impl Section {
    pub fn contains(&self, municipality: &str) -> bool {
        self.municipalities.contains(&municipality)
    }
}

pub static SECTIONS: [Section; 8] = [
    Section {
        number: 1,
        name: "1ª Sección Electoral",
        municipalities: &[
            "Campana",
            "Escobar",
            "General Las Heras",
            "General Rodríguez",
            "General San Martín",
            "Hurlingham",
            "Ituzaingó",
            "José C. Paz",
            "Luján",
            "Malvinas Argentinas",
            "Marcos Paz",
            "Mercedes",
            "Merlo",
            "Moreno",
            "Morón",
            "Navarro",
            "Pilar",
            "San Fernando",
            "San Isidro",
            "San Miguel",
            "Suipacha",
            "Tigre",
            "Tres de Febrero",
            "Vicente López",
        ],
    },
    Section {
        number: 2,
        name: "2ª Sección Electoral",
        municipalities: &[
            "Arrecifes",
            "Baradero",
            "Capitán Sarmiento",
            "Carmen de Areco",
            "Colón",
            "Exaltación de la Cruz",
            "Pergamino",
            "Ramallo",
            "Rojas",
            "Salto",
            "San Andrés de Giles",
            "San Antonio de Areco",
            "San Nicolás",
            "San Pedro",
            "Zárate",
        ],
    },
    Section {
        number: 3,
        name: "3ª Sección Electoral",
        municipalities: &[
            "Almirante Brown",
            "Avellaneda",
            "Berazategui",
            "Berisso",
            "Brandsen",
            "Cañuelas",
            "Ensenada",
            "Esteban Echeverría",
            "Ezeiza",
            "Florencio Varela",
            "La Matanza",
            "Lanús",
            "Lobos",
            "Lomas de Zamora",
            "Magdalena",
            "Presidente Perón",
            "Punta Indio",
            "Quilmes",
            "San Vicente",
        ],
    },
    Section {
        number: 4,
        name: "4ª Sección Electoral",
        municipalities: &[
            "Alberti",
            "Bragado",
            "Carlos Casares",
            "Carlos Tejedor",
            "Chacabuco",
            "Chivilcoy",
            "Florentino Ameghino",
            "General Arenales",
            "General Pinto",
            "General Viamonte",
            "General Villegas",
            "Hipólito Yrigoyen",
            "Junín",
            "Leandro N. Alem",
            "Lincoln",
            "Nueve de Julio",
            "Pehuajó",
            "Rivadavia",
            "Trenque Lauquen",
        ],
    },
    Section {
        number: 5,
        name: "5ª Sección Electoral",
        municipalities: &[
            "Ayacucho",
            "Balcarce",
            "Castelli",
            "Chascomús",
            "Dolores",
            "General Alvarado",
            "General Belgrano",
            "General Guido",
            "General Lavalle",
            "General Madariaga",
            "General Paz",
            "General Pueyrredón",
            "La Costa",
            "Las Flores",
            "Lezama",
            "Lobería",
            "Maipú",
            "Mar Chiquita",
            "Monte",
            "Necochea",
            "Pila",
            "Pinamar",
            "Rauch",
            "San Cayetano",
            "Tandil",
            "Tordillo",
            "Villa Gesell",
        ],
    },
    Section {
        number: 6,
        name: "6ª Sección Electoral",
        municipalities: &[
            "Adolfo Alsina",
            "Adolfo Gonzales Chaves",
            "Bahía Blanca",
            "Benito Juárez",
            "Coronel Dorrego",
            "Coronel Pringles",
            "Coronel Rosales",
            "Coronel Suárez",
            "Daireaux",
            "Guaminí",
            "General Lamadrid",
            "Laprida",
            "Monte Hermoso",
            "Patagones",
            "Pellegrini",
            "Puan",
            "Saavedra",
            "Salliqueló",
            "Tornquist",
            "Tres Arroyos",
            "Tres Lomas",
            "Villarino",
        ],
    },
    Section {
        number: 7,
        name: "7ª Sección Electoral",
        municipalities: &[
            "Azul",
            "Bolívar",
            "General Alvear",
            "Olavarría",
            "Roque Pérez",
            "Saladillo",
            "Tapalqué",
            "Veinticinco de Mayo",
        ],
    },
    Section {
        number: 8,
        name: "8ª Sección Electoral",
        municipalities: &["La Plata", "Isla Martín García"],
    },
];

/// Look up a section by its ordinal number
pub fn section(number: u8) -> Option<&'static Section> {
    SECTIONS.iter().find(|s| s.number == number)
}

/// The section a municipality belongs to
pub fn section_of(municipality: &str) -> Option<&'static Section> {
    SECTIONS.iter().find(|s| s.contains(municipality))
}

/// Every municipality across all sections, once each, sorted
pub fn all_municipalities() -> Vec<&'static str> {
    let mut all: Vec<&'static str> = SECTIONS
        .iter()
        .flat_map(|s| s.municipalities.iter().copied())
        .collect();
    all.sort_unstable();
    all.dedup();
    all
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn sections_are_numbered_one_to_eight() {
        let numbers: Vec<u8> = SECTIONS.iter().map(|s| s.number).collect();
        assert_eq!(numbers, (1..=8).collect::<Vec<u8>>());
    }

    #[test]
    fn section_sizes() {
        let sizes: Vec<usize> = SECTIONS.iter().map(|s| s.municipalities.len()).collect();
        assert_eq!(sizes, vec![24, 15, 19, 19, 27, 22, 8, 2]);
    }

    #[test]
    fn municipalities_are_unique_and_sorted() {
        let all = all_municipalities();
        let unique: HashSet<_> = all.iter().collect();
        assert_eq!(unique.len(), all.len());
        assert!(all.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn flattened_list_covers_every_section() {
        let all = all_municipalities();
        let total: usize = SECTIONS.iter().map(|s| s.municipalities.len()).sum();
        assert_eq!(all.len(), total);
        for s in &SECTIONS {
            for m in s.municipalities {
                assert!(all.contains(m), "missing {m}");
            }
        }
    }

    #[test]
    fn lookup_by_number() {
        assert_eq!(section(8).map(|s| s.name), Some("8ª Sección Electoral"));
        assert!(section(0).is_none());
        assert!(section(9).is_none());
    }

    #[test]
    fn lookup_by_municipality() {
        assert_eq!(section_of("La Plata").map(|s| s.number), Some(8));
        assert_eq!(section_of("Tandil").map(|s| s.number), Some(5));
        assert!(section_of("Rosario").is_none());
    }
}

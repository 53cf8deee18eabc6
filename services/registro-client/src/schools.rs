//! Sample school directory used to pick a polling place

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct School {
    pub id: u32,
    pub name: &'static str,
    pub address: &'static str,
    pub municipality: &'static str,
}

pub static SCHOOLS: [School; 5] = [
    School {
        id: 1,
        name: "Escuela Primaria N° 1 República Argentina",
        address: "Calle 13 y 60",
        municipality: "La Plata",
    },
    School {
        id: 2,
        name: "Escuela Secundaria N° 5",
        address: "Calle 7 entre 57 y 58",
        municipality: "La Plata",
    },
    School {
        id: 3,
        name: "Escuela N° 23 Nicolás Avellaneda",
        address: "Av. Mitre 750",
        municipality: "Avellaneda",
    },
    School {
        id: 4,
        name: "Escuela Técnica N° 1",
        address: "Colón 167",
        municipality: "Avellaneda",
    },
    School {
        id: 5,
        name: "Colegio San Patricio",
        address: "Av. Libertador 1234",
        municipality: "San Isidro",
    },
];

pub fn schools_in(municipality: &str) -> Vec<&'static School> {
    SCHOOLS
        .iter()
        .filter(|s| s.municipality == municipality)
        .collect()
}

pub fn school(id: u32) -> Option<&'static School> {
    SCHOOLS.iter().find(|s| s.id == id)
}

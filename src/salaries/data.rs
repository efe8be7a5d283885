use serde::{Deserialize, Serialize};

/// One row of the salary table. Every cell is free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryRow {
    #[serde(rename = "fullName")]
    pub full_name: String,
    pub email: String,
    pub start_date: String,
    pub experience: String,
    pub age: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Column {
    #[serde(rename = "fullName")]
    FullName,
    #[serde(rename = "email")]
    Email,
    #[serde(rename = "start_date")]
    StartDate,
    #[serde(rename = "experience")]
    Experience,
    #[serde(rename = "age")]
    Age,
}

impl Column {
    pub const ALL: [Column; 5] = [
        Column::FullName,
        Column::Email,
        Column::StartDate,
        Column::Experience,
        Column::Age,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Column::FullName => "fullName",
            Column::Email => "email",
            Column::StartDate => "start_date",
            Column::Experience => "experience",
            Column::Age => "age",
        }
    }

    pub fn header(self) -> &'static str {
        match self {
            Column::FullName => "Name",
            Column::Email => "Email",
            Column::StartDate => "Date",
            Column::Experience => "Experience",
            Column::Age => "Age",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.key() == key)
    }
}

impl SalaryRow {
    pub fn get(&self, column: Column) -> &str {
        match column {
            Column::FullName => &self.full_name,
            Column::Email => &self.email,
            Column::StartDate => &self.start_date,
            Column::Experience => &self.experience,
            Column::Age => &self.age,
        }
    }

    /// Copy of this row with one cell replaced.
    pub fn with(&self, column: Column, value: String) -> Self {
        let mut row = self.clone();
        let slot = match column {
            Column::FullName => &mut row.full_name,
            Column::Email => &mut row.email,
            Column::StartDate => &mut row.start_date,
            Column::Experience => &mut row.experience,
            Column::Age => &mut row.age,
        };
        *slot = value;
        row
    }
}

const SEED: &[(&str, &str, &str, &str, &str)] = &[
    ("Korrie O'Crevy", "kocrevy0@thetimes.co.uk", "09/23/2016", "1 Year", "61"),
    ("Bailie Coulman", "bcoulman1@yolasite.com", "05/20/2018", "3 Years", "63"),
    ("Stella Ganderton", "sganderton2@tuttocitta.it", "03/24/2018", "6 Years", "66"),
    ("Dorolice Crossman", "dcrossman3@google.co.jp", "12/03/2017", "2 Years", "22"),
    ("Harmonia Nisius", "hnisius4@gnu.org", "08/25/2017", "2 Years", "33"),
    ("Genevra Honeywood", "ghoneywood5@narod.ru", "06/01/2017", "7 Years", "61"),
    ("Eileen Diehn", "ediehn6@163.com", "10/15/2017", "6 Years", "59"),
    ("Richardo Aldren", "raldren7@mtv.com", "11/05/2016", "9 Years", "55"),
    ("Allyson Moakler", "amoakler8@shareasale.com", "12/29/2018", "8 Years", "39"),
    ("Merline Penhalewick", "mpenhalewick9@php.net", "04/19/2019", "1 Year", "23"),
    ("De Falloon", "dfalloona@ifeng.com", "06/12/2018", "8 Years", "30"),
    ("Cyrus Gornal", "cgornalb@fda.gov", "12/09/2017", "5 Years", "22"),
    ("Tallou Balf", "tbalfc@sina.com.cn", "01/21/2016", "4 Years", "36"),
];

/// Fixed dataset the grid starts from.
pub fn seed_rows() -> Vec<SalaryRow> {
    SEED.iter()
        .map(|&(name, email, start, experience, age)| SalaryRow {
            full_name: name.into(),
            email: email.into(),
            start_date: start.into(),
            experience: experience.into(),
            age: age.into(),
        })
        .collect()
}

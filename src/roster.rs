//! In-memory student roster. Every mutating operation takes the current
//! selection explicitly so the UI never has to share a "selected row" field
//! with the store.

use log::{info, warn};
use thiserror::Error;

use crate::models::Student;

/// Input problems reported back to the roster form.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RosterError {
    #[error("Please select a student to {action}.")]
    NoSelection { action: &'static str },
    #[error("Age field cannot be empty.")]
    EmptyAge,
    #[error("Please enter a valid number for age.")]
    InvalidAge,
}

/// Ordered list of students, kept in insertion order.
#[derive(Debug, Default, Clone)]
pub struct Roster {
    students: Vec<Student>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn get(&self, index: usize) -> Option<&Student> {
        self.students.get(index)
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    /// Append a new student. A non-numeric age aborts the whole add.
    pub fn add(&mut self, id: &str, name: &str, age: &str) -> Result<&Student, RosterError> {
        let age = parse_age(age)?;
        self.students.push(Student {
            id: id.to_string(),
            name: name.to_string(),
            age,
        });
        info!("added student {id:?} ({} on roster)", self.students.len());
        Ok(&self.students[self.students.len() - 1])
    }

    /// Overwrite all three fields of the selected student in place.
    pub fn update(
        &mut self,
        selected: Option<usize>,
        id: &str,
        name: &str,
        age: &str,
    ) -> Result<(), RosterError> {
        let index = self.require_selection(selected, "update")?;
        if age.trim().is_empty() {
            warn!("rejected roster update with empty age");
            return Err(RosterError::EmptyAge);
        }
        let age = parse_age(age)?;

        let student = &mut self.students[index];
        student.id = id.to_string();
        student.name = name.to_string();
        student.age = age;
        info!("updated student at row {index}");
        Ok(())
    }

    /// Remove the selected student and hand it back to the caller.
    pub fn delete(&mut self, selected: Option<usize>) -> Result<Student, RosterError> {
        let index = self.require_selection(selected, "delete")?;
        let removed = self.students.remove(index);
        info!("deleted student {:?}", removed.id);
        Ok(removed)
    }

    fn require_selection(
        &self,
        selected: Option<usize>,
        action: &'static str,
    ) -> Result<usize, RosterError> {
        match selected {
            Some(index) if index < self.students.len() => Ok(index),
            _ => {
                warn!("roster {action} attempted without a selection");
                Err(RosterError::NoSelection { action })
            }
        }
    }
}

fn parse_age(raw: &str) -> Result<i64, RosterError> {
    raw.trim().parse::<i64>().map_err(|_| {
        warn!("rejected non-numeric age {raw:?}");
        RosterError::InvalidAge
    })
}

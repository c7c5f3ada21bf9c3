use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::Student;

/// Render one `Label: value` row, highlighting the focused field.
fn field_line(
    field_name: &str,
    value: &str,
    is_active: bool,
    placeholder: &str,
    masked: bool,
) -> Line<'static> {
    let display = if value.is_empty() {
        placeholder.to_string()
    } else if masked {
        "*".repeat(value.chars().count())
    } else {
        value.to_string()
    };

    let style = if is_active {
        Style::default().fg(Color::Yellow)
    } else if value.is_empty() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };

    Line::from(vec![
        Span::raw(format!("{field_name}: ")),
        Span::styled(display, style),
    ])
}

/// Form state for adding or updating a roster entry. Values stay as raw text;
/// the roster does the age parsing so the error wording lives in one place.
#[derive(Default, Clone)]
pub(crate) struct StudentForm {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) age: String,
    pub(crate) active: StudentField,
    pub(crate) error: Option<String>,
}

#[derive(Copy, Clone, Default, PartialEq, Eq, Debug)]
pub(crate) enum StudentField {
    #[default]
    Id,
    Name,
    Age,
}

impl StudentForm {
    /// Populate the form from the selected student when updating.
    pub(crate) fn from_student(student: &Student) -> Self {
        Self {
            id: student.id.clone(),
            name: student.name.clone(),
            age: student.age.to_string(),
            active: StudentField::Id,
            error: None,
        }
    }

    pub(crate) fn next_field(&mut self) {
        self.active = match self.active {
            StudentField::Id => StudentField::Name,
            StudentField::Name => StudentField::Age,
            StudentField::Age => StudentField::Id,
        };
    }

    pub(crate) fn previous_field(&mut self) {
        self.active = match self.active {
            StudentField::Id => StudentField::Age,
            StudentField::Name => StudentField::Id,
            StudentField::Age => StudentField::Name,
        };
    }

    /// Append a character to the active field. Age accepts anything printable
    /// so that bad input reaches validation and is reported.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        self.value_mut(self.active).push(ch);
        true
    }

    pub(crate) fn backspace(&mut self) {
        self.value_mut(self.active).pop();
    }

    pub(crate) fn build_line(&self, field_name: &str, field: StudentField) -> Line<'static> {
        field_line(
            field_name,
            self.value(field),
            self.active == field,
            "<empty>",
            false,
        )
    }

    pub(crate) fn value_len(&self, field: StudentField) -> usize {
        self.value(field).chars().count()
    }

    fn value(&self, field: StudentField) -> &str {
        match field {
            StudentField::Id => &self.id,
            StudentField::Name => &self.name,
            StudentField::Age => &self.age,
        }
    }

    fn value_mut(&mut self, field: StudentField) -> &mut String {
        match field {
            StudentField::Id => &mut self.id,
            StudentField::Name => &mut self.name,
            StudentField::Age => &mut self.age,
        }
    }
}

/// Username/password pair used by both the register and login dialogs.
#[derive(Default, Clone)]
pub(crate) struct CredentialsForm {
    pub(crate) username: String,
    pub(crate) password: String,
    pub(crate) active: CredentialsField,
    pub(crate) error: Option<String>,
}

#[derive(Copy, Clone, Default, PartialEq, Eq, Debug)]
pub(crate) enum CredentialsField {
    #[default]
    Username,
    Password,
}

impl CredentialsForm {
    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            CredentialsField::Username => CredentialsField::Password,
            CredentialsField::Password => CredentialsField::Username,
        };
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        match self.active {
            // Usernames are single tokens.
            CredentialsField::Username if ch.is_whitespace() || ch.is_control() => false,
            CredentialsField::Username => {
                self.username.push(ch);
                true
            }
            CredentialsField::Password if ch.is_control() => false,
            CredentialsField::Password => {
                self.password.push(ch);
                true
            }
        }
    }

    pub(crate) fn backspace(&mut self) {
        match self.active {
            CredentialsField::Username => {
                self.username.pop();
            }
            CredentialsField::Password => {
                self.password.pop();
            }
        }
    }

    pub(crate) fn build_line(&self, field_name: &str, field: CredentialsField) -> Line<'static> {
        let (value, masked) = match field {
            CredentialsField::Username => (&self.username, false),
            CredentialsField::Password => (&self.password, true),
        };
        field_line(field_name, value, self.active == field, "<required>", masked)
    }

    pub(crate) fn value_len(&self, field: CredentialsField) -> usize {
        match field {
            CredentialsField::Username => self.username.chars().count(),
            CredentialsField::Password => self.password.chars().count(),
        }
    }
}

/// Catalog entry form. Title and author are required by the catalog itself.
#[derive(Default, Clone)]
pub(crate) struct BookForm {
    pub(crate) title: String,
    pub(crate) author: String,
    pub(crate) genre: String,
    pub(crate) active: BookField,
    pub(crate) error: Option<String>,
}

#[derive(Copy, Clone, Default, PartialEq, Eq, Debug)]
pub(crate) enum BookField {
    #[default]
    Title,
    Author,
    Genre,
}

impl BookForm {
    pub(crate) fn next_field(&mut self) {
        self.active = match self.active {
            BookField::Title => BookField::Author,
            BookField::Author => BookField::Genre,
            BookField::Genre => BookField::Title,
        };
    }

    pub(crate) fn previous_field(&mut self) {
        self.active = match self.active {
            BookField::Title => BookField::Genre,
            BookField::Author => BookField::Title,
            BookField::Genre => BookField::Author,
        };
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        self.value_mut(self.active).push(ch);
        true
    }

    pub(crate) fn backspace(&mut self) {
        self.value_mut(self.active).pop();
    }

    pub(crate) fn build_line(&self, field_name: &str, field: BookField) -> Line<'static> {
        let placeholder = match field {
            BookField::Genre => "<optional>",
            _ => "<required>",
        };
        field_line(
            field_name,
            self.value(field),
            self.active == field,
            placeholder,
            false,
        )
    }

    pub(crate) fn value_len(&self, field: BookField) -> usize {
        self.value(field).chars().count()
    }

    fn value(&self, field: BookField) -> &str {
        match field {
            BookField::Title => &self.title,
            BookField::Author => &self.author,
            BookField::Genre => &self.genre,
        }
    }

    fn value_mut(&mut self, field: BookField) -> &mut String {
        match field {
            BookField::Title => &mut self.title,
            BookField::Author => &mut self.author,
            BookField::Genre => &mut self.genre,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_text(line: &Line<'_>) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    #[test]
    fn student_form_types_into_the_active_field() {
        let mut form = StudentForm::default();
        for ch in "S1".chars() {
            form.push_char(ch);
        }
        form.next_field();
        form.push_char('A');
        form.next_field();
        form.push_char('2');
        form.push_char('x');
        form.backspace();

        assert_eq!((form.id.as_str(), form.name.as_str(), form.age.as_str()), ("S1", "A", "2"));
        form.previous_field();
        assert_eq!(form.active, StudentField::Name);
    }

    #[test]
    fn student_form_prefills_from_record() {
        let student = Student {
            id: "S7".to_string(),
            name: "Grace".to_string(),
            age: 37,
        };
        let form = StudentForm::from_student(&student);
        assert_eq!(form.age, "37");
        assert_eq!(line_text(&form.build_line("Name", StudentField::Name)), "Name: Grace");
    }

    #[test]
    fn password_is_masked_when_rendered() {
        let mut form = CredentialsForm::default();
        assert!(!form.push_char(' '));
        form.push_char('a');
        form.toggle_field();
        for ch in "pw1".chars() {
            form.push_char(ch);
        }

        assert_eq!(line_text(&form.build_line("Password", CredentialsField::Password)), "Password: ***");
        assert_eq!(line_text(&form.build_line("Username", CredentialsField::Username)), "Username: a");
        assert_eq!(form.value_len(CredentialsField::Password), 3);
    }

    #[test]
    fn book_form_marks_genre_optional() {
        let form = BookForm::default();
        assert_eq!(line_text(&form.build_line("Genre", BookField::Genre)), "Genre: <optional>");
        assert_eq!(line_text(&form.build_line("Title", BookField::Title)), "Title: <required>");
    }
}

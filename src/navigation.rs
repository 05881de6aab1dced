use crate::models::School;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Schools,
    SchoolInfo,
    NewInspection,
    NewSchool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    ShowSchools,
    OpenSchool(School),
    /// Inspection for the school currently open.
    InspectSelected,
    /// Inspection started from the menu; the school is picked on the form.
    StartInspection,
    /// School picked on the inspection form.
    SelectSchool(School),
    StartSchool,
}

/// Which view is showing and which school it is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub view: View,
    pub school_id: String,
    pub school_name: String,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            view: View::Schools,
            school_id: String::new(),
            school_name: String::new(),
        }
    }
}

impl AppState {
    pub fn apply(&mut self, transition: Transition) {
        match transition {
            Transition::ShowSchools => self.view = View::Schools,
            Transition::OpenSchool(school) => {
                self.view = View::SchoolInfo;
                self.school_id = school.id;
                self.school_name = school.name;
            }
            Transition::InspectSelected => self.view = View::NewInspection,
            Transition::StartInspection => {
                self.view = View::NewInspection;
                self.school_name.clear();
            }
            Transition::SelectSchool(school) => {
                self.school_id = school.id;
                self.school_name = school.name;
            }
            Transition::StartSchool => self.view = View::NewSchool,
        }
    }

    pub fn selected_school(&self) -> Option<School> {
        if self.school_id.is_empty() || self.school_name.is_empty() {
            return None;
        }
        Some(School {
            id: self.school_id.clone(),
            name: self.school_name.clone(),
        })
    }
}

use strum_macros::{Display, EnumString, IntoStaticStr};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Admin,
    Employee,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        (*self).into()
    }
}

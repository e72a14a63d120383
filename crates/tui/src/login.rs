use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoginError {
    #[error("Email and password required")]
    MissingCredentials,
    #[error("Passwords do not match")]
    PasswordMismatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Name,
    Email,
    Password,
    ConfirmPassword,
}

impl LoginField {
    pub fn label(self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Email => "Email",
            Self::Password => "Password",
            Self::ConfirmPassword => "Confirm password",
        }
    }

    pub fn is_secret(self) -> bool {
        matches!(self, Self::Password | Self::ConfirmPassword)
    }
}

const SIGN_IN_FIELDS: [LoginField; 2] = [LoginField::Email, LoginField::Password];
const REGISTER_FIELDS: [LoginField; 4] = [
    LoginField::Name,
    LoginField::Email,
    LoginField::Password,
    LoginField::ConfirmPassword,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthRequest {
    Login {
        email: String,
        password: String,
    },
    Register {
        email: String,
        password: String,
        name: String,
    },
}

#[derive(Debug, Default)]
pub struct LoginState {
    pub is_register: bool,
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    focus: usize,
    pub error: Option<String>,
    pub pending: bool,
}

impl LoginState {
    pub fn new(email: &str) -> Self {
        Self {
            email: email.to_string(),
            ..Self::default()
        }
    }

    pub fn fields(&self) -> &'static [LoginField] {
        if self.is_register {
            &REGISTER_FIELDS
        } else {
            &SIGN_IN_FIELDS
        }
    }

    pub fn focus(&self) -> LoginField {
        let fields = self.fields();
        fields[self.focus.min(fields.len() - 1)]
    }

    pub fn title(&self) -> &'static str {
        if self.is_register {
            "Create account"
        } else {
            "Sign in"
        }
    }

    pub fn submit_label(&self) -> &'static str {
        if self.pending {
            "Please wait..."
        } else if self.is_register {
            "Register"
        } else {
            "Sign in"
        }
    }

    pub fn toggle_hint(&self) -> &'static str {
        if self.is_register {
            "Already have an account? Sign in"
        } else {
            "Need an account? Register"
        }
    }

    pub fn next_field(&mut self) {
        self.focus = (self.focus + 1) % self.fields().len();
    }

    pub fn prev_field(&mut self) {
        let len = self.fields().len();
        self.focus = (self.focus + len - 1) % len;
    }

    pub fn toggle_mode(&mut self) {
        let current = self.focus();
        self.is_register = !self.is_register;
        self.error = None;
        self.confirm_password.clear();
        self.focus = self
            .fields()
            .iter()
            .position(|f| *f == current)
            .unwrap_or(0);
    }

    pub fn value(&self, field: LoginField) -> &str {
        match field {
            LoginField::Name => &self.name,
            LoginField::Email => &self.email,
            LoginField::Password => &self.password,
            LoginField::ConfirmPassword => &self.confirm_password,
        }
    }

    fn active_mut(&mut self) -> &mut String {
        match self.focus() {
            LoginField::Name => &mut self.name,
            LoginField::Email => &mut self.email,
            LoginField::Password => &mut self.password,
            LoginField::ConfirmPassword => &mut self.confirm_password,
        }
    }

    pub fn input(&mut self, ch: char) {
        self.active_mut().push(ch);
    }

    pub fn backspace(&mut self) {
        self.active_mut().pop();
    }

    /// Validates the form locally; nothing is sent when this fails.
    pub fn submit(&mut self) -> Result<AuthRequest, LoginError> {
        self.error = None;
        let email = self.email.trim();
        if email.is_empty() || self.password.is_empty() {
            return Err(self.fail(LoginError::MissingCredentials));
        }
        if self.is_register && self.password != self.confirm_password {
            return Err(self.fail(LoginError::PasswordMismatch));
        }

        self.pending = true;
        let email = email.to_string();
        let password = self.password.clone();
        Ok(if self.is_register {
            AuthRequest::Register {
                email,
                password,
                name: self.name.trim().to_string(),
            }
        } else {
            AuthRequest::Login { email, password }
        })
    }

    fn fail(&mut self, err: LoginError) -> LoginError {
        self.error = Some(err.to_string());
        err
    }

    /// Clears secrets and returns the toast text for the completed flow.
    pub fn on_success(&mut self, register: bool) -> &'static str {
        self.pending = false;
        self.error = None;
        self.password.clear();
        self.confirm_password.clear();
        if register {
            "Account created successfully. Signed in."
        } else {
            "Signed in successfully"
        }
    }

    pub fn on_failure(&mut self, message: &str) -> String {
        self.pending = false;
        let message = if message.is_empty() {
            "Something went wrong".to_string()
        } else {
            message.to_string()
        };
        self.error = Some(message.clone());
        message
    }
}

use askama::Template;
use axum::{
    extract::{Form, Path, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Serialize;
use tokio::task::spawn_blocking;

use crate::{
    command::{Command, Outcome},
    contact::{Contact, ContactForm, EditContext},
    database::ContactDatabase,
    server::{
        path,
        session::{Flash, FlashKind, Session},
        Accept, ServerError,
    },
    store::ContactStore,
    Error,
};

pub async fn index(
    accept: Accept,
    session: Session,
    State(store): State<&'static ContactStore>,
) -> Result<Response, ServerError> {
    let db = load(store).await?;

    let page = HomePage {
        flashes: session.take_flashes(),
        categories: db.category_names().map(ToOwned::to_owned).collect(),
        contacts: db.contacts().cloned().collect(),
    };

    Ok(accept.into_response(page))
}

#[derive(Template, Serialize)]
#[template(path = "home.html")]
struct HomePage {
    flashes: Vec<Flash>,
    categories: Vec<String>,
    contacts: Vec<Contact>,
}

pub async fn add_contact_page(accept: Accept, session: Session) -> Response {
    let page = ContactFormPage {
        flashes: session.take_flashes(),
        form: session.take_form().unwrap_or_default(),
        original: session.pending_edit(),
    };

    accept.into_response(page)
}

#[derive(Template, Serialize)]
#[template(path = "add_contact.html")]
struct ContactFormPage {
    flashes: Vec<Flash>,
    form: ContactForm,
    original: Option<EditContext>,
}

impl ContactFormPage {
    fn heading(&self) -> &'static str {
        if self.original.is_some() {
            "Edit Contact"
        } else {
            "Add a New Contact"
        }
    }

    fn action(&self) -> String {
        match &self.original {
            Some(original) => path([
                "update_contact",
                original.category.as_str(),
                original.name.as_str(),
            ]),
            None => path(["add_contact"]),
        }
    }
}

pub async fn add_contact(
    session: Session,
    State(store): State<&'static ContactStore>,
    Form(form): Form<ContactForm>,
) -> Result<Response, ServerError> {
    submit(store, session, form).await
}

/// Marks the contact at `category` and `name` as being edited, then submits like
/// [`add_contact`].
pub async fn update_contact(
    Path((category, name)): Path<(String, String)>,
    session: Session,
    State(store): State<&'static ContactStore>,
    Form(form): Form<ContactForm>,
) -> Result<Response, ServerError> {
    session.begin_edit(EditContext { name, category });

    submit(store, session, form).await
}

async fn submit(
    store: &'static ContactStore,
    session: Session,
    form: ContactForm,
) -> Result<Response, ServerError> {
    if let Err(err) = form.validate() {
        tracing::debug!("Rejected contact form: {}", err);

        session.remember_form(form);

        return redirect_on_error(session, err.into());
    }

    let command = Command::Upsert {
        contact: form.to_contact(),
        category: form.category,
        original: session.pending_edit(),
    };

    match execute(store, command).await? {
        Ok(outcome) => {
            session.take_edit();
            session.take_form();

            Ok(redirect_on_success(session, outcome))
        }
        Err(err) => redirect_on_error(session, err),
    }
}

pub async fn edit_contact(
    Path((category, name)): Path<(String, String)>,
    session: Session,
    State(store): State<&'static ContactStore>,
) -> Result<Response, ServerError> {
    let db = load(store).await?;

    let contact = match db.find_contact(&category, &name) {
        Some(contact) => contact,
        None => {
            return redirect_on_error(session, Error::NotFound("Contact not found!".to_owned()))
        }
    };

    session.remember_form(ContactForm::from_contact(contact, &category));
    session.begin_edit(EditContext { name, category });

    Ok(Redirect::to(&path(["add_contact"])).into_response())
}

pub async fn contact(
    Path(name): Path<String>,
    accept: Accept,
    session: Session,
    State(store): State<&'static ContactStore>,
) -> Result<Response, ServerError> {
    let db = load(store).await?;

    let (category, contact) = match db.find_by_name(&name) {
        Some((category, contact)) => (category.to_owned(), contact.clone()),
        None => {
            return redirect_on_error(
                session,
                Error::NotFound(format!("No contact found for {}.", name)),
            )
        }
    };

    let page = ContactPage {
        flashes: session.take_flashes(),
        name,
        category,
        contact,
    };

    Ok(accept.into_response(page))
}

#[derive(Template, Serialize)]
#[template(path = "contactinfo.html")]
struct ContactPage {
    flashes: Vec<Flash>,
    name: String,
    category: String,
    contact: Contact,
}

pub async fn category(
    Path(category): Path<String>,
    accept: Accept,
    session: Session,
    State(store): State<&'static ContactStore>,
) -> Result<Response, ServerError> {
    let db = load(store).await?;

    let contacts = match db.category(&category) {
        Some(found) => found.contacts.clone(),
        None => {
            return redirect_on_error(
                session,
                Error::NotFound(format!("No contacts found for {}.", category)),
            )
        }
    };

    let page = CategoryPage {
        flashes: session.take_flashes(),
        categories: db.category_names().map(ToOwned::to_owned).collect(),
        title: category,
        contacts,
    };

    Ok(accept.into_response(page))
}

#[derive(Template, Serialize)]
#[template(path = "categories.html")]
struct CategoryPage {
    flashes: Vec<Flash>,
    title: String,
    contacts: Vec<Contact>,
    categories: Vec<String>,
}

pub async fn delete_contact(
    Path((category, name)): Path<(String, String)>,
    session: Session,
    State(store): State<&'static ContactStore>,
) -> Result<Response, ServerError> {
    match execute(store, Command::DeleteContact { category, name }).await? {
        Ok(outcome) => Ok(redirect_on_success(session, outcome)),
        Err(err) => redirect_on_error(session, err),
    }
}

pub async fn delete_category(
    Path(category): Path<String>,
    session: Session,
    State(store): State<&'static ContactStore>,
) -> Result<Response, ServerError> {
    match execute(store, Command::DeleteCategory { category }).await? {
        Ok(outcome) => Ok(redirect_on_success(session, outcome)),
        Err(err) => redirect_on_error(session, err),
    }
}

async fn load(store: &'static ContactStore) -> Result<ContactDatabase, ServerError> {
    let db = spawn_blocking(move || store.read()).await??;

    Ok(db)
}

async fn execute(
    store: &'static ContactStore,
    command: Command,
) -> Result<Result<Outcome, Error>, ServerError> {
    let res = spawn_blocking(move || store.execute(command)).await?;

    Ok(res)
}

fn redirect_on_success(session: Session, outcome: Outcome) -> Response {
    session.flash(FlashKind::Success, outcome.to_string());

    let location = match outcome.category() {
        Some(category) => path(["categories", category]),
        None => "/".to_owned(),
    };

    Redirect::to(&location).into_response()
}

/// Reports recoverable errors to the user and sends them back to where they can act on it.
fn redirect_on_error(session: Session, err: Error) -> Result<Response, ServerError> {
    let location = match err {
        Error::Validation(err) => {
            session.flash(FlashKind::Error, err.to_string());

            path(["add_contact"])
        }
        Error::NotFound(msg) => {
            session.flash(FlashKind::Error, msg);

            "/".to_owned()
        }
        Error::Persistence(err) => return Err(err.into()),
    };

    Ok(Redirect::to(&location).into_response())
}

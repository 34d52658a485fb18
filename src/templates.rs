use tera::{Context, Tera};

use crate::{authentication::AuthUser, errors::RequestError};

const TEMPLATES: [(&str, &str); 18] = [
    ("base.html", include_str!("../templates/base.html")),
    (
        "includes/header.html",
        include_str!("../templates/includes/header.html"),
    ),
    (
        "includes/paginator.html",
        include_str!("../templates/includes/paginator.html"),
    ),
    (
        "includes/post_card.html",
        include_str!("../templates/includes/post_card.html"),
    ),
    (
        "includes/macros.html",
        include_str!("../templates/includes/macros.html"),
    ),
    (
        "posts/index.html",
        include_str!("../templates/posts/index.html"),
    ),
    (
        "posts/group_list.html",
        include_str!("../templates/posts/group_list.html"),
    ),
    (
        "posts/profile.html",
        include_str!("../templates/posts/profile.html"),
    ),
    (
        "posts/post_detail.html",
        include_str!("../templates/posts/post_detail.html"),
    ),
    (
        "posts/create_post.html",
        include_str!("../templates/posts/create_post.html"),
    ),
    (
        "posts/follow.html",
        include_str!("../templates/posts/follow.html"),
    ),
    (
        "about/author.html",
        include_str!("../templates/about/author.html"),
    ),
    ("about/tech.html", include_str!("../templates/about/tech.html")),
    (
        "users/login.html",
        include_str!("../templates/users/login.html"),
    ),
    (
        "users/signup.html",
        include_str!("../templates/users/signup.html"),
    ),
    (
        "users/logged_out.html",
        include_str!("../templates/users/logged_out.html"),
    ),
    ("core/404.html", include_str!("../templates/core/404.html")),
    ("core/500.html", include_str!("../templates/core/500.html")),
];

/// The compiled page templates, embedded in the binary.
pub struct Templates {
    tera: Tera,
}

impl std::fmt::Debug for Templates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Templates")
            .field("count", &self.tera.get_template_names().count())
            .finish()
    }
}

impl Templates {
    pub fn new() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES.to_vec())?;
        Ok(Templates { tera })
    }

    /// A context carrying what every page needs: the signed-in user.
    pub fn context(user: Option<&AuthUser>) -> Context {
        let mut context = Context::new();
        context.insert("user", &user);
        context
    }

    pub fn render(&self, template: &str, context: &Context) -> Result<String, RequestError> {
        let mut context = context.clone();
        context.insert("template_name", template);
        self.tera.render(template, &context).map_err(|e| {
            tracing::error!("Failed to render {}: {:?}", template, e);
            RequestError::from(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_template_compiles() {
        let templates = Templates::new().unwrap();
        assert_eq!(templates.tera.get_template_names().count(), TEMPLATES.len());
    }

    #[test]
    fn static_pages_render_with_their_template_marker() {
        let templates = Templates::new().unwrap();
        let html = templates
            .render("about/tech.html", &Templates::context(None))
            .unwrap();
        assert!(html.contains(r#"data-template="about/tech.html""#));
    }
}

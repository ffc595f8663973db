use std::sync::Arc;

use crate::AppContext;
use crate::error::AuthError;
use crate::ui::{AuthMode, BusyGuard, ElementId, Scope, Screen, Teardown};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Credentials {
    Login,
    Signup,
}

impl Credentials {
    fn button(self) -> ElementId {
        match self {
            Credentials::Login => ElementId::LoginButton,
            Credentials::Signup => ElementId::SignupButton,
        }
    }
}

fn show_mode(ctx: &AppContext, mode: AuthMode) {
    ctx.registry.update(|r| {
        r.auth.mode = mode;
        r.auth.error.clear();
    });
}

fn submit(ctx: &AppContext, kind: Credentials) {
    let (email, password) = ctx.registry.update(|r| {
        r.auth.error.clear();
        match kind {
            Credentials::Login => (r.auth.login_email.clone(), r.auth.login_password.clone()),
            Credentials::Signup => (r.auth.signup_email.clone(), r.auth.signup_password.clone()),
        }
    });

    let busy = BusyGuard::engage(ctx.registry.clone(), kind.button());
    let ctx = ctx.clone();
    tokio::spawn(async move {
        let _busy = busy;
        let result = match kind {
            Credentials::Login => ctx.auth.sign_in(&email, &password).await,
            Credentials::Signup => ctx.auth.sign_up(&email, &password).await,
        };
        match result {
            // 跳转由登录状态监听负责
            Ok(user) => ctx.registry.update(|r| match kind {
                Credentials::Login => r.auth.login_password.clear(),
                Credentials::Signup => {
                    tracing::info!("Signed up {}", user.email);
                    r.auth.signup_password.clear();
                }
            }),
            Err(e) => {
                tracing::warn!("{:?} failed: {}", kind, e);
                show_error(&ctx, &e);
            }
        }
    });
}

fn show_error(ctx: &AppContext, error: &AuthError) {
    let message = error.message();
    ctx.registry.update(|r| r.auth.error = message);
}

/// 挂载认证区域与退出按钮，生命周期与应用相同
pub fn mount(ctx: &AppContext) -> Teardown {
    let scope: Arc<Scope> = Scope::new(Screen::Auth, ctx.registry.clone());

    {
        let ctx = ctx.clone();
        scope.bind(ElementId::ShowLoginTab, move |_| show_mode(&ctx, AuthMode::Login));
    }
    {
        let ctx = ctx.clone();
        scope.bind(ElementId::ShowSignupTab, move |_| show_mode(&ctx, AuthMode::Signup));
    }
    {
        let ctx = ctx.clone();
        scope.bind(ElementId::LoginButton, move |_| submit(&ctx, Credentials::Login));
    }
    {
        let ctx = ctx.clone();
        scope.bind(ElementId::SignupButton, move |_| submit(&ctx, Credentials::Signup));
    }
    {
        let ctx = ctx.clone();
        scope.bind(ElementId::LogoutButton, move |_| {
            let auth = ctx.auth.clone();
            tokio::spawn(async move {
                if let Err(e) = auth.sign_out().await {
                    tracing::error!("Error signing out: {}", e);
                }
            });
        });
    }

    Teardown::new(scope)
}

use crate::application::ports::{
    AuthenticatedUser, IdentityGateway, LocalCartStore, RemoteCartStore, UserDirectory,
};
use crate::domain::entities::{Cart, CartLine, CartLineDraft, UserProfileDraft};
use crate::domain::value_objects::LineId;
use crate::shared::config::CartConfig;
use crate::shared::error::CartError;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Sign-in session lifecycle. `Merging` is entered at most once per
/// transition from `Guest`/`Unknown` to an authenticated identity and always
/// exits to `SignedIn`, whether the merge completed or aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Unknown,
    Guest,
    Merging,
    SignedIn,
}

/// Non-blocking cart read. `Loading` means no snapshot has been taken for the
/// active identity yet; callers must not render it as an empty cart.
#[derive(Debug, Clone, PartialEq)]
pub enum CartView {
    Loading,
    Ready(Cart),
}

#[derive(Debug, Clone, PartialEq)]
pub enum AddOutcome {
    Added(CartLine),
    /// The sign-in prompt was dismissed; nothing was stored.
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Signed out, local cart empty, or the merge already ran this session.
    Skipped,
    Completed {
        merged: usize,
    },
    /// One upsert failed; the successful prefix stays remote and the local
    /// blob is kept for a retry on the next trigger.
    Aborted {
        merged: usize,
    },
}

#[derive(Debug, Clone)]
struct SessionState {
    phase: SessionPhase,
    merge_complete: bool,
    user: Option<AuthenticatedUser>,
}

/// Single source of truth for the cart, hiding the local/remote split.
///
/// Which store is authoritative is a pure function of the identity boundary's
/// signed-in state, never caller-selectable. All collaborators are injected;
/// no ambient singletons.
pub struct CartService {
    identity: Arc<dyn IdentityGateway>,
    local: Arc<dyn LocalCartStore>,
    remote: Arc<dyn RemoteCartStore>,
    directory: Arc<dyn UserDirectory>,
    require_sign_in: bool,
    session: RwLock<SessionState>,
    snapshot: RwLock<Option<Cart>>,
}

impl CartService {
    pub fn new(
        identity: Arc<dyn IdentityGateway>,
        local: Arc<dyn LocalCartStore>,
        remote: Arc<dyn RemoteCartStore>,
        directory: Arc<dyn UserDirectory>,
        config: &CartConfig,
    ) -> Self {
        Self {
            identity,
            local,
            remote,
            directory,
            require_sign_in: config.require_sign_in,
            session: RwLock::new(SessionState {
                phase: SessionPhase::Unknown,
                merge_complete: false,
                user: None,
            }),
            snapshot: RwLock::new(None),
        }
    }

    /// Re-reads the identity boundary and, on a guest-to-account transition,
    /// merges the guest cart into the remote cart. Call whenever the sign-in
    /// state may have changed; the first cart operation of a session calls it
    /// implicitly.
    ///
    /// The merge runs at most once per sign-in session. A mid-sequence
    /// failure is swallowed to a warn log (`MergeOutcome::Aborted`); the cart
    /// stays usable either way.
    pub async fn sync_on_sign_in(&self) -> Result<MergeOutcome, CartError> {
        let Some(user) = self.identity.current_user().await? else {
            let mut session = self.session.write().await;
            if session.user.is_some() || session.phase == SessionPhase::Unknown {
                *self.snapshot.write().await = None;
            }
            session.phase = SessionPhase::Guest;
            session.merge_complete = false;
            session.user = None;
            return Ok(MergeOutcome::Skipped);
        };

        // Mirror the identity profile into the store before any cart
        // mutation is issued against it.
        self.directory.provision(profile_draft(&user)).await?;

        let guest_cart = {
            let mut session = self.session.write().await;
            if session.phase == SessionPhase::Merging {
                return Ok(MergeOutcome::Skipped);
            }
            if session.user.as_ref().map(|u| &u.id) != Some(&user.id) {
                session.merge_complete = false;
                *self.snapshot.write().await = None;
            }
            session.user = Some(user.clone());
            if session.merge_complete {
                session.phase = SessionPhase::SignedIn;
                return Ok(MergeOutcome::Skipped);
            }

            let guest_cart = self.local.load().await?;
            if guest_cart.is_empty() {
                session.merge_complete = true;
                session.phase = SessionPhase::SignedIn;
                return Ok(MergeOutcome::Skipped);
            }
            session.phase = SessionPhase::Merging;
            guest_cart
        };

        self.merge_guest_cart(&user, guest_cart).await
    }

    /// Merge algorithm: one upsert per guest line, strictly sequential. The
    /// remote find-or-create is not atomic, so concurrent upserts for the
    /// same variant could create duplicate lines instead of one incremented
    /// line.
    async fn merge_guest_cart(
        &self,
        user: &AuthenticatedUser,
        guest_cart: Cart,
    ) -> Result<MergeOutcome, CartError> {
        let mut merged = 0usize;

        for line in guest_cart.lines() {
            match self
                .remote
                .upsert_line(&user.id, &line.draft(), line.quantity)
                .await
            {
                Ok(_) => merged += 1,
                Err(err) => {
                    return self.abort_merge(merged, err).await;
                }
            }
        }

        // The successful upserts are already remote; a failed clear leaves
        // the blob for the retry, which will re-increment (at-least-once).
        if let Err(err) = self.local.clear().await {
            return self.abort_merge(merged, err).await;
        }

        let mut session = self.session.write().await;
        session.merge_complete = true;
        session.phase = SessionPhase::SignedIn;
        drop(session);
        *self.snapshot.write().await = None;

        info!(
            "Merged {} guest cart line(s) into account {}",
            merged, user.id
        );
        Ok(MergeOutcome::Completed { merged })
    }

    async fn abort_merge(&self, merged: usize, err: CartError) -> Result<MergeOutcome, CartError> {
        let aborted = CartError::MergeAborted {
            merged,
            reason: err.to_string(),
        };
        warn!("Guest cart merge aborted: {}", aborted);

        let mut session = self.session.write().await;
        // merge_complete stays false so the next trigger retries.
        session.phase = SessionPhase::SignedIn;
        drop(session);
        // Any merged prefix already changed the remote cart, so the last
        // snapshot no longer reflects the authoritative store.
        *self.snapshot.write().await = None;
        Ok(MergeOutcome::Aborted { merged })
    }

    /// The current cart: remote lines when signed in, local lines otherwise.
    pub async fn cart(&self) -> Result<Cart, CartError> {
        self.ensure_session().await?;
        self.reload().await
    }

    /// Last snapshot without touching any store. Eventually consistent with
    /// in-flight mutations.
    pub async fn view(&self) -> CartView {
        match self.snapshot.read().await.clone() {
            Some(cart) => CartView::Ready(cart),
            None => CartView::Loading,
        }
    }

    pub async fn phase(&self) -> SessionPhase {
        self.session.read().await.phase
    }

    /// Adds `quantity` of the drafted product to the active cart, collapsing
    /// onto an existing line with the same variant key.
    ///
    /// When signed out and the service is configured to require sign-in, this
    /// suspends on the identity boundary's prompt; a dismissal resolves to
    /// `AddOutcome::Cancelled` without touching any store.
    pub async fn add_item(
        &self,
        draft: CartLineDraft,
        quantity: u32,
    ) -> Result<AddOutcome, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidInput(
                "Quantity must be at least 1".to_string(),
            ));
        }
        self.ensure_session().await?;

        if self.active_user().await.is_none() && self.require_sign_in {
            let signed_in = self
                .identity
                .prompt_sign_in("You need to sign in to add items to your cart")
                .await?;
            if !signed_in {
                return Ok(AddOutcome::Cancelled);
            }
            // Sign-in transition: run the merge before the new item lands.
            self.sync_on_sign_in().await?;
            if self.active_user().await.is_none() {
                return Ok(AddOutcome::Cancelled);
            }
        }

        let line = match self.active_user().await {
            Some(user) => self.remote.upsert_line(&user.id, &draft, quantity).await?,
            None => {
                let mut cart = self.local.load().await?;
                let line = cart.upsert(draft, quantity).clone();
                self.local.save(&cart).await?;
                line
            }
        };

        self.reload().await?;
        Ok(AddOutcome::Added(line))
    }

    /// Sets a line's quantity; anything below one removes the line from the
    /// active store (delete-on-nonpositive is the store contract, not an
    /// error).
    pub async fn update_quantity(&self, line: &LineId, quantity: u32) -> Result<(), CartError> {
        self.ensure_session().await?;

        match self.active_user().await {
            Some(user) => {
                self.remote.set_quantity(&user.id, line, quantity).await?;
            }
            None => {
                let mut cart = self.local.load().await?;
                cart.set_quantity(line, quantity);
                self.local.save(&cart).await?;
            }
        }

        self.reload().await?;
        Ok(())
    }

    pub async fn remove_item(&self, line: &LineId) -> Result<(), CartError> {
        self.ensure_session().await?;

        match self.active_user().await {
            Some(user) => self.remote.remove_line(&user.id, line).await?,
            None => {
                let mut cart = self.local.load().await?;
                cart.remove(line);
                self.local.save(&cart).await?;
            }
        }

        self.reload().await?;
        Ok(())
    }

    pub async fn clear(&self) -> Result<(), CartError> {
        self.ensure_session().await?;

        match self.active_user().await {
            Some(user) => self.remote.clear(&user.id).await?,
            None => self.local.clear().await?,
        }

        self.reload().await?;
        Ok(())
    }

    /// Sum of `unit_price_minor * quantity`, recomputed from a fresh load on
    /// every call.
    pub async fn total_minor(&self) -> Result<i64, CartError> {
        Ok(self.cart().await?.total_minor())
    }

    /// Sum of quantities, from the same line set `total_minor` sees.
    pub async fn item_count(&self) -> Result<u32, CartError> {
        Ok(self.cart().await?.item_count())
    }

    /// Whether the signed-in user is an admin. False for guests.
    pub async fn is_admin(&self) -> Result<bool, CartError> {
        self.ensure_session().await?;
        match self.active_user().await {
            Some(user) => self.directory.is_admin(&user.id).await,
            None => Ok(false),
        }
    }

    async fn ensure_session(&self) -> Result<(), CartError> {
        if self.session.read().await.phase == SessionPhase::Unknown {
            self.sync_on_sign_in().await?;
        }
        Ok(())
    }

    async fn active_user(&self) -> Option<AuthenticatedUser> {
        self.session.read().await.user.clone()
    }

    async fn reload(&self) -> Result<Cart, CartError> {
        let cart = match self.active_user().await {
            Some(user) => Cart::from_lines(self.remote.fetch(&user.id).await?),
            None => self.local.load().await?,
        };
        *self.snapshot.write().await = Some(cart.clone());
        Ok(cart)
    }
}

fn profile_draft(user: &AuthenticatedUser) -> UserProfileDraft {
    UserProfileDraft {
        auth_id: user.id.clone(),
        email: user.email.clone(),
        name: user.name.clone(),
        image_url: user.image_url.clone(),
    }
}


#[cfg(test)]
mod scenarios {
    //! End-to-end flows over the real adapters.

    use super::*;
    use crate::domain::value_objects::UserId;
    use crate::infrastructure::database::{ConnectionPool, SqliteCartStore, SqliteUserDirectory};
    use crate::infrastructure::storage::JsonCartStore;
    use async_trait::async_trait;
    use tempfile::TempDir;

    /// Deterministic identity boundary for tests.
    struct StaticIdentity {
        user: Option<AuthenticatedUser>,
    }

    #[async_trait]
    impl IdentityGateway for StaticIdentity {
        async fn current_user(&self) -> Result<Option<AuthenticatedUser>, CartError> {
            Ok(self.user.clone())
        }

        async fn prompt_sign_in(&self, _message: &str) -> Result<bool, CartError> {
            Ok(self.user.is_some())
        }
    }

    struct Fixture {
        pool: ConnectionPool,
        dir: TempDir,
    }

    impl Fixture {
        async fn new() -> Self {
            let pool = ConnectionPool::from_memory().await.unwrap();
            pool.migrate().await.unwrap();
            Self {
                pool,
                dir: TempDir::new().unwrap(),
            }
        }

        fn local(&self) -> JsonCartStore {
            JsonCartStore::new(self.dir.path().join("guest_cart.json"))
        }

        /// A fresh service instance, i.e. a fresh sign-in session.
        fn service(&self, user: Option<AuthenticatedUser>) -> CartService {
            CartService::new(
                Arc::new(StaticIdentity { user }),
                Arc::new(self.local()),
                Arc::new(SqliteCartStore::new(self.pool.get_pool().clone())),
                Arc::new(SqliteUserDirectory::new(
                    self.pool.get_pool().clone(),
                    vec![],
                )),
                &CartConfig {
                    require_sign_in: false,
                    admin_emails: vec![],
                },
            )
        }
    }

    fn shopper() -> AuthenticatedUser {
        AuthenticatedUser {
            id: UserId::new("user_123".to_string()).unwrap(),
            email: "shopper@example.com".to_string(),
            name: Some("Shopper".to_string()),
            image_url: None,
        }
    }

    fn draft(product_id: &str, price: i64, size: &str, color: &str) -> CartLineDraft {
        CartLineDraft {
            product_id: product_id.to_string(),
            name: format!("Product {product_id}"),
            unit_price_minor: price,
            original_unit_price_minor: None,
            image_url: format!("/images/{product_id}.jpg"),
            category: "apparel".to_string(),
            size: Some(size.to_string()),
            color: Some(color.to_string()),
        }
    }

    #[tokio::test]
    async fn guest_cart_merges_into_account_on_sign_in() {
        let fx = Fixture::new().await;

        // Guest session: one line, quantity 2.
        let guest = fx.service(None);
        guest
            .add_item(draft("p1", 1299, "M", "Red"), 2)
            .await
            .unwrap();

        // Signed-in session against an empty remote cart.
        let signed_in = fx.service(Some(shopper()));
        let outcome = signed_in.sync_on_sign_in().await.unwrap();
        assert_eq!(outcome, MergeOutcome::Completed { merged: 1 });

        let cart = signed_in.cart().await.unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.lines()[0].quantity, 2);
        assert_eq!(cart.lines()[0].size.as_deref(), Some("M"));

        // The guest blob is gone.
        assert!(fx.local().load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn merging_twice_doubles_remote_quantities() {
        // Regression guard: the merge is at-least-once, not exactly-once. A
        // re-triggered merge with the same local lines re-increments the
        // remote quantities rather than detecting the earlier run.
        let fx = Fixture::new().await;

        let guest = fx.service(None);
        guest
            .add_item(draft("p1", 1299, "M", "Red"), 2)
            .await
            .unwrap();
        let guest_lines = fx.local().load().await.unwrap();

        let first = fx.service(Some(shopper()));
        assert_eq!(
            first.sync_on_sign_in().await.unwrap(),
            MergeOutcome::Completed { merged: 1 }
        );

        // Same local lines reappear (e.g. restored blob), new session.
        fx.local().save(&guest_lines).await.unwrap();
        let second = fx.service(Some(shopper()));
        assert_eq!(
            second.sync_on_sign_in().await.unwrap(),
            MergeOutcome::Completed { merged: 1 }
        );

        let cart = second.cart().await.unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.lines()[0].quantity, 4);
    }

    #[tokio::test]
    async fn setting_quantity_to_zero_empties_the_signed_in_cart() {
        let fx = Fixture::new().await;
        let svc = fx.service(Some(shopper()));

        let outcome = svc.add_item(draft("p1", 1299, "M", "Red"), 3).await.unwrap();
        let line = match outcome {
            AddOutcome::Added(line) => line,
            AddOutcome::Cancelled => panic!("expected an added line"),
        };

        svc.update_quantity(&line.id, 0).await.unwrap();

        assert!(svc.cart().await.unwrap().is_empty());
        assert_eq!(svc.item_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn totals_and_counts_follow_the_same_line_set() {
        let fx = Fixture::new().await;
        let svc = fx.service(Some(shopper()));

        svc.add_item(draft("p1", 1299, "M", "Red"), 2).await.unwrap();
        svc.add_item(draft("p2", 2499, "L", "Blue"), 1).await.unwrap();

        assert_eq!(svc.total_minor().await.unwrap(), 1299 * 2 + 2499);
        assert_eq!(svc.item_count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn guest_duplicate_adds_collapse_to_one_line() {
        let fx = Fixture::new().await;
        let svc = fx.service(None);

        svc.add_item(draft("p1", 1299, "M", "Red"), 1).await.unwrap();
        svc.add_item(draft("p1", 1299, "M", "Red"), 1).await.unwrap();

        let cart = svc.cart().await.unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.lines()[0].quantity, 2);
    }

    #[tokio::test]
    async fn clear_empties_the_remote_cart() {
        let fx = Fixture::new().await;
        let svc = fx.service(Some(shopper()));

        svc.add_item(draft("p1", 1299, "M", "Red"), 1).await.unwrap();
        svc.add_item(draft("p2", 2499, "L", "Blue"), 1).await.unwrap();
        svc.clear().await.unwrap();

        assert!(svc.cart().await.unwrap().is_empty());
        assert_eq!(svc.total_minor().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn admin_flag_comes_from_the_configured_allowlist() {
        let fx = Fixture::new().await;
        let directory =
            SqliteUserDirectory::new(fx.pool.get_pool().clone(), vec![
                "shopper@example.com".to_string(),
            ]);
        let svc = CartService::new(
            Arc::new(StaticIdentity {
                user: Some(shopper()),
            }),
            Arc::new(fx.local()),
            Arc::new(SqliteCartStore::new(fx.pool.get_pool().clone())),
            Arc::new(directory),
            &CartConfig {
                require_sign_in: false,
                admin_emails: vec![],
            },
        );

        assert!(svc.is_admin().await.unwrap());
    }
}

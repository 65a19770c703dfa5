//! Shared world state for stage gating BDD scenarios.

use std::sync::Arc;

use chrono::Utc;
use eyre::WrapErr;
use mockable::DefaultClock;
use rstest::fixture;

use vasari::engine::domain::ProjectState;
use vasari::engine::services::StateAnalyzer;
use vasari::pipeline::adapters::memory::InMemoryBoard;
use vasari::pipeline::domain::{
    ArtifactFile, ArtifactKind, Idea, IdeaId, Review, ReviewAuthor, ReviewGrade, Stage,
    StageThresholds, VersionToken,
};
use vasari::pipeline::ports::AcceptAllHumanReviews;
use vasari::pipeline::services::RepositoryStateStore;

/// Store type used by the BDD world.
pub type TestStateStore = RepositoryStateStore<InMemoryBoard, AcceptAllHumanReviews, DefaultClock>;

/// Reviewer logins cycled through so successive reviews come from
/// distinct humans.
const REVIEWERS: [&str; 6] = ["alice", "ben", "chen", "dana", "erin", "farid"];

const REVIEW_BODY: &str = "Sound method; the evaluation could use one more baseline.";

/// Scenario world for stage gating behaviour tests.
pub struct GatingWorld {
    /// The state store under test.
    pub store: TestStateStore,
    /// Stage entry thresholds, at their defaults.
    pub thresholds: StageThresholds,
    /// Identifier of the idea the scenario drives.
    pub idea: Option<IdeaId>,
    /// Version token observed after the most recent write.
    pub version: Option<VersionToken>,
    /// Count of recorded reviews, used to cycle reviewer logins.
    pub reviews_recorded: usize,
}

impl GatingWorld {
    /// Creates a world over an empty board with default thresholds.
    #[must_use]
    pub fn new() -> Self {
        let store = RepositoryStateStore::new(
            Arc::new(InMemoryBoard::new()),
            Arc::new(AcceptAllHumanReviews),
            Arc::new(DefaultClock),
        );
        Self {
            store,
            thresholds: StageThresholds::default(),
            idea: None,
            version: None,
            reviews_recorded: 0,
        }
    }

    /// Registers the scenario idea and binds its design document.
    pub async fn seed_idea_with_design(&mut self) -> Result<(), eyre::Report> {
        let id = IdeaId::new("spectral-pruning")?;
        let idea = Idea::new(id.clone(), "Spectral pruning of attention heads", &DefaultClock)?;
        let version = self
            .store
            .register_idea(&idea)
            .await
            .wrap_err("register scenario idea")?;
        self.idea = Some(id);
        self.version = Some(version);
        self.commit_primary(
            ArtifactKind::DesignDoc,
            "## Design\n\nPrune attention heads by spectral mass.",
        )
        .await
    }

    /// Marches the seeded idea into progress with every artifact bound:
    /// design and plan each gather five human points before their gate.
    pub async fn march_to_in_progress(&mut self) -> Result<(), eyre::Report> {
        self.seed_idea_with_design().await?;
        self.record_human_reviews(ArtifactKind::DesignDoc, 5).await?;
        self.advance_to(Stage::Ready).await?;
        self.commit_primary(
            ArtifactKind::ImplementationPlan,
            "## Plan\n\n1. Rank heads by spectral mass.\n2. Prune and fine-tune.",
        )
        .await?;
        self.record_human_reviews(ArtifactKind::ImplementationPlan, 5)
            .await?;
        self.advance_to(Stage::InProgress).await?;
        self.commit_primary(ArtifactKind::Code, "import torch\n\n\ndef prune(model):\n    return model")
            .await?;
        self.commit_primary(
            ArtifactKind::Paper,
            "We prune attention heads ranked by spectral mass [1].\n\n\
             ## References\n\n\
             [1] A. Author, Pruning by spectral mass, https://example.org/pruning",
        )
        .await
    }

    /// Commits the primary file of one artifact category and binds it.
    pub async fn commit_primary(
        &mut self,
        kind: ArtifactKind,
        contents: &str,
    ) -> Result<(), eyre::Report> {
        let (id, version) = self.tracked()?;
        let name = kind
            .primary_file_name()
            .ok_or_else(|| eyre::eyre!("artifact kind {kind} has no primary file"))?;
        let file = ArtifactFile::new(name, contents.to_owned())?;
        let receipt = self
            .store
            .commit_artifact(
                &id,
                &version,
                kind,
                vec![file],
                &format!("Add {}", kind.display_name()),
            )
            .await
            .wrap_err("commit scenario artifact")?;
        self.version = Some(receipt.version);
        Ok(())
    }

    /// Records reviews by successive human reviewers against a category.
    pub async fn record_human_reviews(
        &mut self,
        target: ArtifactKind,
        count: usize,
    ) -> Result<(), eyre::Report> {
        for _ in 0..count {
            let login = REVIEWERS
                .iter()
                .cycle()
                .nth(self.reviews_recorded)
                .copied()
                .unwrap_or("guest");
            let author = ReviewAuthor::human(login)?;
            self.append(author, target, false).await?;
        }
        Ok(())
    }

    /// Records model reviews against a category.
    pub async fn record_model_reviews(
        &mut self,
        target: ArtifactKind,
        count: usize,
    ) -> Result<(), eyre::Report> {
        for _ in 0..count {
            let author = ReviewAuthor::llm("hermes-7b")?;
            self.append(author, target, false).await?;
        }
        Ok(())
    }

    /// Records a human review that requests substantive clarification.
    pub async fn record_clarification_request(
        &mut self,
        target: ArtifactKind,
    ) -> Result<(), eyre::Report> {
        let author = ReviewAuthor::human("harriet")?;
        self.append(author, target, true).await
    }

    /// Advances the tracked idea to the given stage through the domain.
    pub async fn advance_to(&mut self, to: Stage) -> Result<(), eyre::Report> {
        let (id, _) = self.tracked()?;
        let mut fetched = self
            .store
            .get_idea(&id)
            .await
            .wrap_err("fetch idea before advancing")?;
        fetched
            .idea
            .advance_stage(to, &self.thresholds, Utc::now())?;
        let version = self
            .store
            .save_idea(&id, &fetched.version, &fetched.idea)
            .await
            .wrap_err("save advanced idea")?;
        self.version = Some(version);
        Ok(())
    }

    /// Derives the scheduling view of the tracked idea from a fresh read.
    pub async fn state(&self) -> Result<ProjectState, eyre::Report> {
        let (id, _) = self.tracked()?;
        let fetched = self
            .store
            .get_idea(&id)
            .await
            .wrap_err("fetch idea for inspection")?;
        Ok(StateAnalyzer::analyze(&fetched))
    }

    /// Returns the tracked idea and the version from the latest write.
    pub fn tracked(&self) -> Result<(IdeaId, VersionToken), eyre::Report> {
        let id = self
            .idea
            .clone()
            .ok_or_else(|| eyre::eyre!("no idea seeded in scenario world"))?;
        let version = self
            .version
            .clone()
            .ok_or_else(|| eyre::eyre!("no version tracked in scenario world"))?;
        Ok((id, version))
    }

    async fn append(
        &mut self,
        author: ReviewAuthor,
        target: ArtifactKind,
        clarification: bool,
    ) -> Result<(), eyre::Report> {
        let (id, version) = self.tracked()?;
        let mut review = Review::new(author, ReviewGrade::new(7)?, target, REVIEW_BODY, Utc::now())?;
        if clarification {
            review = review.with_clarification_request();
        }
        let receipt = self
            .store
            .append_review(&id, &version, &review)
            .await
            .wrap_err("append scenario review")?;
        self.version = Some(receipt.version);
        self.reviews_recorded += 1;
        Ok(())
    }
}

impl Default for GatingWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> GatingWorld {
    GatingWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

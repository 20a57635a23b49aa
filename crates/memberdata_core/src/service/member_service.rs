//! Member/Team use-case service.
//!
//! # Responsibility
//! - Provide typed `Member`/`Team` views over generic entity stores.
//! - Expose the member repository queries (derived, IN, paging, bulk, DTO).
//!
//! # Invariants
//! - A member's `team` reference always points at a stored team when saved.
//! - Team data is fetched by explicit lookup; nothing is loaded lazily.

use crate::model::entity::{Entity, EntityId};
use crate::model::schema::EntitySchema;
use crate::model::value::FieldType;
use crate::query::page::{Page, PageRequest};
use crate::query::predicate::{Operand, Predicate};
use crate::repo::entity_repo::{EntityRepository, RepoError, RepoResult};
use crate::repo::memory_repo::InMemoryEntityStore;
use crate::service::repository_service::RepositoryService;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

static MEMBER_SCHEMA: Lazy<EntitySchema> = Lazy::new(|| {
    EntitySchema::new(
        "Member",
        [
            ("username", FieldType::Text),
            ("age", FieldType::Integer),
            ("team", FieldType::Reference),
        ],
    )
    .expect("valid member schema")
});

static TEAM_SCHEMA: Lazy<EntitySchema> = Lazy::new(|| {
    EntitySchema::new("Team", [("name", FieldType::Text)]).expect("valid team schema")
});

pub fn member_schema() -> EntitySchema {
    MEMBER_SCHEMA.clone()
}

pub fn team_schema() -> EntitySchema {
    TEAM_SCHEMA.clone()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: Option<EntityId>,
    pub name: String,
}

impl Team {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }

    fn to_entity(&self) -> Entity {
        let entity = match self.id {
            Some(id) => Entity::new().identified_by(id),
            None => Entity::new(),
        };
        entity.with("name", self.name.as_str())
    }
}

impl TryFrom<Entity> for Team {
    type Error = RepoError;

    fn try_from(entity: Entity) -> Result<Self, Self::Error> {
        let name = entity
            .text("name")
            .ok_or_else(|| RepoError::InvalidData("team without name".to_string()))?
            .to_string();
        Ok(Self {
            id: entity.id(),
            name,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: Option<EntityId>,
    pub username: String,
    pub age: i64,
    /// Id of the owning team; resolve with `MemberService::team_of`.
    pub team: Option<EntityId>,
}

impl Member {
    pub fn new(username: impl Into<String>) -> Self {
        Self::with_age(username, 0)
    }

    pub fn with_age(username: impl Into<String>, age: i64) -> Self {
        Self {
            id: None,
            username: username.into(),
            age,
            team: None,
        }
    }

    /// Joins `team`, which must already be saved.
    pub fn in_team(mut self, team: &Team) -> Self {
        self.team = team.id;
        self
    }

    fn to_entity(&self) -> Entity {
        let entity = match self.id {
            Some(id) => Entity::new().identified_by(id),
            None => Entity::new(),
        };
        let entity = entity
            .with("username", self.username.as_str())
            .with("age", self.age);
        match self.team {
            Some(team) => entity.with("team", team),
            None => entity,
        }
    }
}

impl TryFrom<Entity> for Member {
    type Error = RepoError;

    fn try_from(entity: Entity) -> Result<Self, Self::Error> {
        let username = entity
            .text("username")
            .ok_or_else(|| RepoError::InvalidData("member without username".to_string()))?
            .to_string();
        Ok(Self {
            id: entity.id(),
            username,
            age: entity.integer("age").unwrap_or_default(),
            team: entity.reference("team"),
        })
    }
}

/// Member projection joined with its team name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDto {
    pub id: EntityId,
    pub username: String,
    pub team_name: String,
}

fn members_from(entities: Vec<Entity>) -> RepoResult<Vec<Member>> {
    entities.into_iter().map(Member::try_from).collect()
}

/// Hand-written member queries living beside the derived ones.
pub trait MemberRepositoryCustom {
    /// Every stored member, read straight from the store.
    fn find_member_custom(&self) -> RepoResult<Vec<Member>>;
}

impl MemberRepositoryCustom for InMemoryEntityStore {
    fn find_member_custom(&self) -> RepoResult<Vec<Member>> {
        if self.schema().name() != MEMBER_SCHEMA.name() {
            return Err(RepoError::InvalidData(format!(
                "`{}` store holds no members",
                self.schema().name()
            )));
        }
        members_from(self.all())
    }
}

/// Use-case service over the member and team stores.
pub struct MemberService {
    members: RepositoryService<InMemoryEntityStore>,
    teams: RepositoryService<InMemoryEntityStore>,
}

impl Default for MemberService {
    fn default() -> Self {
        Self::new()
    }
}

impl MemberService {
    pub fn new() -> Self {
        Self {
            members: RepositoryService::new(InMemoryEntityStore::new(member_schema())),
            teams: RepositoryService::new(InMemoryEntityStore::new(team_schema())),
        }
    }

    /// Saves a team and writes the assigned id back into it.
    pub fn save_team(&mut self, team: &mut Team) -> RepoResult<EntityId> {
        let id = self.teams.save(&team.to_entity())?;
        team.id = Some(id);
        Ok(id)
    }

    pub fn find_team(&self, id: EntityId) -> RepoResult<Team> {
        Team::try_from(self.teams.get(id)?)
    }

    /// Saves a member and writes the assigned id back into it.
    ///
    /// # Errors
    /// - `NotFound` when the member references a team that is not stored.
    pub fn save_member(&mut self, member: &mut Member) -> RepoResult<EntityId> {
        if let Some(team) = member.team {
            if self.teams.find_by_id(team).is_none() {
                return Err(RepoError::NotFound(team));
            }
        }
        let id = self.members.save(&member.to_entity())?;
        member.id = Some(id);
        Ok(id)
    }

    pub fn find_member(&self, id: EntityId) -> RepoResult<Member> {
        Member::try_from(self.members.get(id)?)
    }

    pub fn find_all_members(&self) -> RepoResult<Vec<Member>> {
        members_from(self.members.find_all())
    }

    pub fn count_members(&self) -> usize {
        self.members.count()
    }

    pub fn delete_member(&mut self, id: EntityId) -> bool {
        self.members.delete(id)
    }

    pub fn find_by_username_and_age_greater_than(
        &self,
        username: &str,
        age: i64,
    ) -> RepoResult<Vec<Member>> {
        members_from(self.members.find_by_derived(
            "findByUsernameAndAgeGreaterThan",
            [Operand::from(username), Operand::from(age)],
        )?)
    }

    pub fn find_by_username(&self, username: &str) -> RepoResult<Vec<Member>> {
        members_from(
            self.members
                .find_by_derived("findByUsername", [Operand::from(username)])?,
        )
    }

    /// Members with exactly this username and age.
    pub fn find_user(&self, username: &str, age: i64) -> RepoResult<Vec<Member>> {
        let predicate = Predicate::builder(&MEMBER_SCHEMA)
            .eq("username", username)
            .eq("age", age)
            .build()?;
        members_from(self.members.find_by(&predicate)?)
    }

    /// At most one member by username.
    ///
    /// # Errors
    /// - `NonUniqueResult` when several members share the username.
    pub fn find_optional_by_username(&self, username: &str) -> RepoResult<Option<Member>> {
        let mut found = self.find_by_username(username)?;
        if found.len() > 1 {
            return Err(RepoError::NonUniqueResult {
                entity: MEMBER_SCHEMA.name().to_string(),
                count: found.len(),
            });
        }
        Ok(found.pop())
    }

    pub fn find_username_list(&self) -> RepoResult<Vec<String>> {
        Ok(self
            .find_all_members()?
            .into_iter()
            .map(|member| member.username)
            .collect())
    }

    /// Members joined with their team; members without a team are skipped.
    pub fn find_member_dto(&self) -> RepoResult<Vec<MemberDto>> {
        let mut dtos = Vec::new();
        for member in self.find_all_members()? {
            let (Some(id), Some(team)) = (member.id, self.team_of(&member)?) else {
                continue;
            };
            dtos.push(MemberDto {
                id,
                username: member.username,
                team_name: team.name,
            });
        }
        Ok(dtos)
    }

    pub fn find_by_names<S: AsRef<str>>(&self, names: &[S]) -> RepoResult<Vec<Member>> {
        let predicate = Predicate::builder(&MEMBER_SCHEMA)
            .is_in("username", names.iter().map(|name| name.as_ref()))
            .build()?;
        members_from(self.members.find_by(&predicate)?)
    }

    pub fn find_by_age(&self, age: i64, request: &PageRequest) -> RepoResult<Page<Member>> {
        let predicate = Predicate::builder(&MEMBER_SCHEMA).eq("age", age).build()?;
        self.members
            .find_page(&predicate, request)?
            .try_map(Member::try_from)
    }

    /// Adds one year to every member aged `age` or older; returns the count.
    pub fn bulk_age_plus(&mut self, age: i64) -> RepoResult<usize> {
        let predicate = Predicate::builder(&MEMBER_SCHEMA).gte("age", age).build()?;
        self.members.bulk_update(&predicate, |entity| {
            let next = entity
                .integer("age")
                .and_then(|current| current.checked_add(1))
                .ok_or_else(|| RepoError::InvalidData("age overflow".to_string()))?;
            entity.set("age", next);
            Ok(())
        })
    }

    /// Runs the custom member query against the member store.
    pub fn find_member_custom(&self) -> RepoResult<Vec<Member>> {
        self.members.repository().find_member_custom()
    }

    /// Looks up the member's team, if it has one.
    ///
    /// # Errors
    /// - `NotFound` when the referenced team has been removed.
    pub fn team_of(&self, member: &Member) -> RepoResult<Option<Team>> {
        member.team.map(|id| self.find_team(id)).transpose()
    }
}

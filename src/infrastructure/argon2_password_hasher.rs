use argon2::{
    Algorithm, Argon2, Params, PasswordHash as Argon2Hash, Version,
    password_hash::{PasswordHasher as Argon2Hasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::{
    config::HashingConfig,
    domain::{
        error::DomainError,
        models::credential::HashedPassword,
        services::password_service::PasswordHasher,
    },
};

/// Argon2id hasher with deployment-tunable cost parameters
#[derive(Clone)]
pub struct Argon2PasswordHasher {
    params: Params,
}

impl Argon2PasswordHasher {
    pub fn new(config: &HashingConfig) -> Result<Self, DomainError> {
        let params = Params::new(
            config.memory_kib,
            config.work_factor,
            config.parallelism,
            None,
        )
        .map_err(|e| DomainError::Hashing(e.to_string()))?;

        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, plain_password: &str) -> Result<HashedPassword, DomainError> {
        if plain_password.is_empty() {
            return Err(DomainError::InvalidInput("password must not be empty"));
        }

        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2()
            .hash_password(plain_password.as_bytes(), &salt)
            .map_err(|e| DomainError::Hashing(e.to_string()))?
            .to_string();

        Ok(HashedPassword::new(hash))
    }

    fn verify(&self, plain_password: &str, hashed_password: &HashedPassword) -> Result<bool, DomainError> {
        let parsed_hash =
            Argon2Hash::new(hashed_password.as_str()).map_err(|_| DomainError::MalformedHash)?;

        // Cost parameters and salt come from the stored hash; the output
        // comparison inside verify_password is constant time.
        Ok(self
            .argon2()
            .verify_password(plain_password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    fn needs_rehash(&self, hashed_password: &HashedPassword) -> bool {
        let Ok(parsed_hash) = Argon2Hash::new(hashed_password.as_str()) else {
            return false;
        };

        if parsed_hash.algorithm != Algorithm::Argon2id.ident() {
            return true;
        }

        match Params::try_from(&parsed_hash) {
            Ok(stored) => {
                stored.m_cost() != self.params.m_cost()
                    || stored.t_cost() != self.params.t_cost()
                    || stored.p_cost() != self.params.p_cost()
            }
            Err(_) => true,
        }
    }
}
